//! # Shared Control State
//!
//! [`ControlState`] is the single record of raw axes, filtered axes and arm
//! state. It is owned by a [`ControlHandle`] behind one mutex that both the
//! input side and the transmitter take only long enough to copy or commit the
//! whole record. No I/O and no encoding happens under the lock, so the
//! transmitter never sees a half-applied update and the input side never
//! waits on the serial port.
//!
//! The input bridge drives the handle through two entry points:
//!
//! - [`ControlHandle::on_axis`] for every absolute-axis event
//! - [`ControlHandle::on_button`] for every key event
//!
//! ```
//! use rc_link::control::axis::{Axis, AxisInfo};
//! use rc_link::control::state::{Button, ControlHandle, ControlSettings};
//! use rc_link::shutdown::Shutdown;
//!
//! let control = ControlHandle::new(ControlSettings::default(), Shutdown::new());
//!
//! // Throttle trigger released, then press Options (arm)
//! control.on_axis(Axis::Throttle, 0, &AxisInfo::trigger(0, 255));
//! control.on_button(Button::Options, true);
//!
//! assert!(control.snapshot().arm_state().is_armed());
//! ```

use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::arming::{ArmRefusal, ArmState, ArmingGate, DisarmReset, GatedAxes};
use super::axis::{Axis, AxisInfo, RawSample};
use super::filter::{AxisFilter, LowPassFilter, DEFAULT_ALPHA, DEFAULT_DEADZONE};
use crate::shutdown::Shutdown;

/// Raw and filtered axis values plus arm state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlState {
    raw: [f32; 4],
    filtered: [f32; 4],
    arm_state: ArmState,
}

impl ControlState {
    #[inline]
    pub fn raw(&self, axis: Axis) -> f32 {
        self.raw[axis.index()]
    }

    #[inline]
    pub fn filtered(&self, axis: Axis) -> f32 {
        self.filtered[axis.index()]
    }

    pub fn raw_values(&self) -> [f32; 4] {
        self.raw
    }

    pub fn filtered_values(&self) -> [f32; 4] {
        self.filtered
    }

    #[inline]
    pub fn arm_state(&self) -> ArmState {
        self.arm_state
    }

    pub fn set_raw(&mut self, axis: Axis, value: f32) {
        self.raw[axis.index()] = value;
    }

    pub fn set_filtered(&mut self, axis: Axis, value: f32) {
        self.filtered[axis.index()] = value;
    }

    pub(super) fn set_arm_state(&mut self, arm_state: ArmState) {
        self.arm_state = arm_state;
    }

    pub(super) fn clear_raw(&mut self) {
        self.raw = [0.0; 4];
    }

    pub(super) fn clear_filtered(&mut self) {
        self.filtered = [0.0; 4];
    }

    /// Commits a normalized sample and steps the filter on all four axes.
    pub fn commit_sample(&mut self, axis: Axis, normalized: f32, lpf: &LowPassFilter) {
        self.raw[axis.index()] = normalized;
        lpf.apply_all(&self.raw, &mut self.filtered);
    }
}

/// Gamepad buttons the link reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Cross,
    Circle,
    Square,
    Triangle,
    L1,
    R1,
    L2,
    R2,
    Share,
    Options,
    Ps,
    L3,
    R3,
}

/// Discrete commands resolved from button presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Arm,
    Disarm,
    /// Disarm and stop the link after one final safe frame.
    Kill,
}

/// Which button issues which command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ButtonBindings {
    #[serde(default = "default_arm_button")]
    pub arm: Button,
    #[serde(default = "default_disarm_button")]
    pub disarm: Button,
    #[serde(default = "default_kill_button")]
    pub kill: Button,
}

fn default_arm_button() -> Button { Button::Options }
fn default_disarm_button() -> Button { Button::Share }
fn default_kill_button() -> Button { Button::Ps }

impl Default for ButtonBindings {
    fn default() -> Self {
        Self {
            arm: default_arm_button(),
            disarm: default_disarm_button(),
            kill: default_kill_button(),
        }
    }
}

impl ButtonBindings {
    /// Kill wins over disarm, disarm wins over arm, if bindings overlap.
    #[must_use]
    pub fn resolve(&self, button: Button) -> Option<ControlEvent> {
        if button == self.kill {
            Some(ControlEvent::Kill)
        } else if button == self.disarm {
            Some(ControlEvent::Disarm)
        } else if button == self.arm {
            Some(ControlEvent::Arm)
        } else {
            None
        }
    }
}

/// Tunables for the input-to-state path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSettings {
    pub deadzone: f32,
    pub alpha: f32,
    pub arm_throttle_max: f32,
    pub throttle_limit: f32,
    pub disarm_reset: DisarmReset,
    pub buttons: ButtonBindings,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
            alpha: DEFAULT_ALPHA,
            arm_throttle_max: super::arming::DEFAULT_ARM_THROTTLE_MAX,
            throttle_limit: 1.0,
            disarm_reset: DisarmReset::Immediate,
            buttons: ButtonBindings::default(),
        }
    }
}

struct Shared {
    state: Mutex<ControlState>,
    filter: AxisFilter,
    lpf: LowPassFilter,
    gate: ArmingGate,
    buttons: ButtonBindings,
    shutdown: Shutdown,
}

/// Cloneable owner of the shared [`ControlState`].
///
/// `on_axis` and `on_button` are meant to be driven from a single input
/// thread; any number of readers may call [`ControlHandle::snapshot`].
#[derive(Clone)]
pub struct ControlHandle {
    inner: Arc<Shared>,
}

impl std::fmt::Debug for ControlHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlHandle")
            .field("gate", &self.inner.gate)
            .finish_non_exhaustive()
    }
}

impl ControlHandle {
    #[must_use]
    pub fn new(settings: ControlSettings, shutdown: Shutdown) -> Self {
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(ControlState::default()),
                filter: AxisFilter::new(settings.deadzone),
                lpf: LowPassFilter::new(settings.alpha),
                gate: ArmingGate::new(
                    settings.arm_throttle_max,
                    settings.throttle_limit,
                    settings.disarm_reset,
                ),
                buttons: settings.buttons,
                shutdown,
            }),
        }
    }

    pub fn gate(&self) -> &ArmingGate {
        &self.inner.gate
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.inner.shutdown
    }

    /// Copies the whole record out under the lock.
    #[must_use]
    pub fn snapshot(&self) -> ControlState {
        *self.inner.state.lock()
    }

    /// Snapshot already resolved through the arming gate.
    #[must_use]
    pub fn gated(&self) -> GatedAxes {
        let snapshot = self.snapshot();
        self.inner.gate.resolve(&snapshot)
    }

    /// Runs `f` with exclusive access to the state.
    pub fn update<R>(&self, f: impl FnOnce(&mut ControlState) -> R) -> R {
        let mut state = self.inner.state.lock();
        f(&mut state)
    }

    /// Axis event from the input bridge.
    pub fn on_axis(&self, axis: Axis, raw: i32, info: &AxisInfo) {
        let sample = RawSample {
            axis,
            value: raw,
            invert: info.invert,
        };
        let normalized = self.inner.filter.normalize_sample(&sample, info);

        let lpf = self.inner.lpf;
        self.update(|state| state.commit_sample(axis, normalized, &lpf));
    }

    /// Button event from the input bridge. Only presses act.
    pub fn on_button(&self, button: Button, pressed: bool) -> Option<ControlEvent> {
        if !pressed {
            return None;
        }

        let event = self.inner.buttons.resolve(button)?;
        debug!("{:?} pressed -> {:?}", button, event);
        self.apply(event);
        Some(event)
    }

    /// Applies a discrete command.
    pub fn apply(&self, event: ControlEvent) {
        match event {
            ControlEvent::Arm => {
                // Refusal is already logged by the gate
                let _ = self.arm();
            }
            ControlEvent::Disarm => {
                self.disarm();
            }
            ControlEvent::Kill => self.kill(),
        }
    }

    pub fn arm(&self) -> Result<(), ArmRefusal> {
        let gate = self.inner.gate;
        self.update(|state| gate.try_arm(state))
    }

    pub fn disarm(&self) -> bool {
        let gate = self.inner.gate;
        self.update(|state| gate.disarm(state))
    }

    /// Disarms and requests shutdown of the link.
    pub fn kill(&self) {
        warn!("KILL requested, disarming and stopping link");
        self.disarm();
        if self.inner.shutdown.trigger() {
            info!("Shutdown requested");
        }
    }
}
