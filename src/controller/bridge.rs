//! # Input Bridge
//!
//! Translates evdev events into [`ControlHandle::on_axis`] and
//! [`ControlHandle::on_button`] calls on a dedicated thread.
//!
//! ## Button Mapping
//!
//! | evdev Code | Button |
//! |------------|--------|
//! | BTN_SOUTH | Cross |
//! | BTN_EAST | Circle |
//! | BTN_WEST | Square |
//! | BTN_NORTH | Triangle |
//! | BTN_TL / BTN_TR | L1 / R1 |
//! | BTN_TL2 / BTN_TR2 | L2 / R2 |
//! | BTN_SELECT | Share |
//! | BTN_START | Options |
//! | BTN_MODE | PS |
//! | BTN_THUMBL / BTN_THUMBR | L3 / R3 |

use evdev::{InputEvent, InputEventKind, Key};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

use super::gamepad::Gamepad;
use crate::config::ControllerConfig;
use crate::control::{Axis, AxisInfo, Button, ControlHandle};

/// Maps an evdev key to a gamepad button.
pub fn button_for_key(key: Key) -> Option<Button> {
    let button = match key {
        Key::BTN_SOUTH => Button::Cross,
        Key::BTN_EAST => Button::Circle,
        Key::BTN_WEST => Button::Square,
        Key::BTN_NORTH => Button::Triangle,
        Key::BTN_TL => Button::L1,
        Key::BTN_TR => Button::R1,
        Key::BTN_TL2 => Button::L2,
        Key::BTN_TR2 => Button::R2,
        Key::BTN_SELECT => Button::Share,
        Key::BTN_START => Button::Options,
        Key::BTN_MODE => Button::Ps,
        Key::BTN_THUMBL => Button::L3,
        Key::BTN_THUMBR => Button::R3,
        _ => return None,
    };
    Some(button)
}

/// Absolute axis code to control axis and range.
#[derive(Debug, Clone, Default)]
pub struct AxisMap {
    entries: Vec<(u16, Axis, AxisInfo)>,
}

impl AxisMap {
    pub fn new(entries: Vec<(u16, Axis, AxisInfo)>) -> Self {
        Self { entries }
    }

    /// Builds the map from config bindings, with ranges from `info_for`.
    pub fn from_config(
        config: &ControllerConfig,
        mut info_for: impl FnMut(&crate::config::AxisBinding) -> AxisInfo,
    ) -> Self {
        let bindings = [
            (Axis::Roll, &config.roll),
            (Axis::Pitch, &config.pitch),
            (Axis::Yaw, &config.yaw),
            (Axis::Throttle, &config.throttle),
        ];

        let entries = bindings
            .into_iter()
            .filter_map(|(axis, binding)| {
                let code = binding.abs_code()?;
                let info = info_for(binding);
                debug!(
                    "{} <- {} ({}..{}, {:?}{})",
                    axis.name(),
                    binding.code,
                    info.min,
                    info.max,
                    info.kind,
                    if info.invert { ", inverted" } else { "" }
                );
                Some((code, axis, info))
            })
            .collect();

        Self { entries }
    }

    pub fn lookup(&self, code: u16) -> Option<(Axis, AxisInfo)> {
        self.entries
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|&(_, axis, info)| (axis, info))
    }
}

/// Feeds one event into the control state. Unbound axes, unknown keys and
/// key repeats are ignored.
pub fn dispatch_event(control: &ControlHandle, axes: &AxisMap, event: &InputEvent) {
    match event.kind() {
        InputEventKind::AbsAxis(abs) => {
            if let Some((axis, info)) = axes.lookup(abs.0) {
                control.on_axis(axis, event.value(), &info);
            }
        }
        InputEventKind::Key(key) => {
            // 2 is autorepeat
            if event.value() == 2 {
                return;
            }
            if let Some(button) = button_for_key(key) {
                control.on_button(button, event.value() != 0);
            }
        }
        _ => {}
    }
}

/// Owns the gamepad and pumps its events into the control state.
pub struct InputBridge {
    gamepad: Gamepad,
    axes: AxisMap,
    control: ControlHandle,
}

impl InputBridge {
    pub fn new(gamepad: Gamepad, config: &ControllerConfig, control: ControlHandle) -> Self {
        let axes = AxisMap::from_config(config, |binding| gamepad.axis_info(binding));
        Self {
            gamepad,
            axes,
            control,
        }
    }

    /// Blocking event loop.
    ///
    /// Returns when shutdown is requested (checked between event batches) or
    /// when the device fails. A device failure disarms and requests shutdown.
    pub fn run(mut self) {
        info!("Input bridge reading {}", self.gamepad.device_path().display());
        let shutdown = self.control.shutdown().clone();

        while !shutdown.is_triggered() {
            match self.gamepad.fetch_events() {
                Ok(events) => {
                    for event in events {
                        dispatch_event(&self.control, &self.axes, &event);
                    }
                }
                Err(e) => {
                    error!("Controller lost: {}", e);
                    self.control.disarm();
                    shutdown.trigger();
                    break;
                }
            }
        }

        debug!("Input bridge stopped");
    }

    /// Runs [`InputBridge::run`] on a named OS thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("input-bridge".to_string())
            .spawn(move || self.run())
    }
}
