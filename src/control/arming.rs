//! # Arming Gate
//!
//! Two-state safety gate between the filtered sticks and the encoders.
//!
//! ```text
//!            arm (throttle <= threshold)
//! Disarmed ------------------------------> Armed
//!    ^                                       |
//!    +---------- disarm / kill / signal -----+
//! ```
//!
//! Encoders never read [`ControlState`] directly; they read the
//! [`GatedAxes`] produced by [`ArmingGate::resolve`], which is all-safe while
//! disarmed.

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::axis::Axis;
use super::state::ControlState;

/// Default maximum filtered throttle that still allows arming.
pub const DEFAULT_ARM_THROTTLE_MAX: f32 = 0.05;

/// Arm state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArmState {
    #[default]
    Disarmed,
    Armed,
}

impl ArmState {
    #[inline]
    pub fn is_armed(self) -> bool {
        matches!(self, ArmState::Armed)
    }
}

/// What a disarm does to the stored axis values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisarmReset {
    /// Zero raw and filtered values on the spot.
    #[default]
    Immediate,
    /// Zero raw values only; filtered values decay through the filter.
    Decay,
}

/// Why an arm request was refused. The gate stays disarmed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ArmRefusal {
    #[error("throttle {throttle:.3} is above the arming limit {threshold:.3}")]
    ThrottleTooHigh { throttle: f32, threshold: f32 },
}

/// Axis values as the encoders must see them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatedAxes {
    pub armed: bool,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub throttle: f32,
}

impl GatedAxes {
    /// Centered sticks, zero throttle, disarmed.
    pub const SAFE: GatedAxes = GatedAxes {
        armed: false,
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
        throttle: 0.0,
    };

    /// Builds an armed vector from explicit values.
    #[must_use]
    pub fn armed(roll: f32, pitch: f32, yaw: f32, throttle: f32) -> Self {
        Self {
            armed: true,
            roll,
            pitch,
            yaw,
            throttle,
        }
    }
}

/// Arming policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmingGate {
    arm_throttle_max: f32,
    throttle_limit: f32,
    disarm_reset: DisarmReset,
}

impl Default for ArmingGate {
    fn default() -> Self {
        Self::new(DEFAULT_ARM_THROTTLE_MAX, 1.0, DisarmReset::Immediate)
    }
}

impl ArmingGate {
    /// # Arguments
    ///
    /// * `arm_throttle_max` - Highest filtered throttle (0..1) accepted when arming
    /// * `throttle_limit` - Scale applied to throttle while armed (0..1]
    /// * `disarm_reset` - What happens to stored axis values on disarm
    #[must_use]
    pub fn new(arm_throttle_max: f32, throttle_limit: f32, disarm_reset: DisarmReset) -> Self {
        Self {
            arm_throttle_max: arm_throttle_max.clamp(0.0, 1.0),
            throttle_limit: throttle_limit.clamp(0.0, 1.0),
            disarm_reset,
        }
    }

    #[must_use]
    pub fn arm_throttle_max(&self) -> f32 {
        self.arm_throttle_max
    }

    /// Checks the arming precondition without changing state.
    pub fn check_arm(&self, state: &ControlState) -> Result<(), ArmRefusal> {
        let throttle = state.filtered(Axis::Throttle);
        // NaN fails the comparison and is refused
        if throttle <= self.arm_throttle_max {
            Ok(())
        } else {
            Err(ArmRefusal::ThrottleTooHigh {
                throttle,
                threshold: self.arm_throttle_max,
            })
        }
    }

    /// Disarmed -> Armed, if the throttle is down. Arming while armed is a no-op.
    pub fn try_arm(&self, state: &mut ControlState) -> Result<(), ArmRefusal> {
        if state.arm_state().is_armed() {
            return Ok(());
        }

        match self.check_arm(state) {
            Ok(()) => {
                state.set_arm_state(ArmState::Armed);
                info!("ARMED");
                Ok(())
            }
            Err(refusal) => {
                warn!("Arm refused: {}", refusal);
                Err(refusal)
            }
        }
    }

    /// Armed -> Disarmed. Returns whether the state actually changed.
    pub fn disarm(&self, state: &mut ControlState) -> bool {
        if !state.arm_state().is_armed() {
            return false;
        }

        state.set_arm_state(ArmState::Disarmed);
        state.clear_raw();
        if self.disarm_reset == DisarmReset::Immediate {
            state.clear_filtered();
        }
        info!("DISARMED");
        true
    }

    /// Resolves a state snapshot into encoder input.
    #[must_use]
    pub fn resolve(&self, state: &ControlState) -> GatedAxes {
        if !state.arm_state().is_armed() {
            return GatedAxes::SAFE;
        }

        GatedAxes {
            armed: true,
            roll: state.filtered(Axis::Roll),
            pitch: state.filtered(Axis::Pitch),
            yaw: state.filtered(Axis::Yaw),
            throttle: state.filtered(Axis::Throttle) * self.throttle_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_throttle(throttle: f32) -> ControlState {
        let mut state = ControlState::default();
        state.set_filtered(Axis::Throttle, throttle);
        state
    }

    #[test]
    fn test_initial_state_is_disarmed() {
        let state = ControlState::default();
        assert_eq!(state.arm_state(), ArmState::Disarmed);
        assert_eq!(ArmingGate::default().resolve(&state), GatedAxes::SAFE);
    }

    #[test]
    fn test_arm_refused_with_throttle_up() {
        let gate = ArmingGate::default();
        let mut state = state_with_throttle(0.10);

        let result = gate.try_arm(&mut state);
        assert!(matches!(result, Err(ArmRefusal::ThrottleTooHigh { .. })));
        assert_eq!(state.arm_state(), ArmState::Disarmed);
    }

    #[test]
    fn test_arm_accepted_with_throttle_down() {
        let gate = ArmingGate::default();
        let mut state = state_with_throttle(0.02);

        assert!(gate.try_arm(&mut state).is_ok());
        assert_eq!(state.arm_state(), ArmState::Armed);
    }

    #[test]
    fn test_arm_at_exact_threshold() {
        let gate = ArmingGate::default();
        let mut state = state_with_throttle(DEFAULT_ARM_THROTTLE_MAX);
        assert!(gate.try_arm(&mut state).is_ok());
    }

    #[test]
    fn test_arm_refused_on_nan_throttle() {
        let gate = ArmingGate::default();
        let mut state = state_with_throttle(f32::NAN);
        assert!(gate.try_arm(&mut state).is_err());
    }

    #[test]
    fn test_arm_while_armed_is_noop() {
        let gate = ArmingGate::default();
        let mut state = state_with_throttle(0.0);
        gate.try_arm(&mut state).unwrap();

        // Throttle up, re-arm must not fail or disarm
        state.set_filtered(Axis::Throttle, 0.8);
        assert!(gate.try_arm(&mut state).is_ok());
        assert!(state.arm_state().is_armed());
    }

    #[test]
    fn test_disarm_zeroes_immediately() {
        let gate = ArmingGate::default();
        let mut state = state_with_throttle(0.0);
        gate.try_arm(&mut state).unwrap();

        state.set_raw(Axis::Roll, 0.9);
        state.set_filtered(Axis::Roll, 0.7);
        state.set_filtered(Axis::Throttle, 0.6);

        assert!(gate.disarm(&mut state));
        assert_eq!(state.arm_state(), ArmState::Disarmed);
        assert_eq!(state.raw_values(), [0.0; 4]);
        assert_eq!(state.filtered_values(), [0.0; 4]);
    }

    #[test]
    fn test_disarm_decay_keeps_filtered() {
        let gate = ArmingGate::new(0.05, 1.0, DisarmReset::Decay);
        let mut state = state_with_throttle(0.0);
        gate.try_arm(&mut state).unwrap();
        state.set_raw(Axis::Pitch, 0.5);
        state.set_filtered(Axis::Pitch, 0.4);

        gate.disarm(&mut state);
        assert_eq!(state.raw_values(), [0.0; 4]);
        assert_eq!(state.filtered(Axis::Pitch), 0.4);

        // Still safe on the wire
        assert_eq!(gate.resolve(&state), GatedAxes::SAFE);
    }

    #[test]
    fn test_disarm_when_disarmed_reports_no_change() {
        let gate = ArmingGate::default();
        let mut state = ControlState::default();
        assert!(!gate.disarm(&mut state));
    }

    #[test]
    fn test_resolve_passes_sticks_through_when_armed() {
        let gate = ArmingGate::default();
        let mut state = state_with_throttle(0.0);
        gate.try_arm(&mut state).unwrap();
        state.set_filtered(Axis::Roll, 0.3);
        state.set_filtered(Axis::Pitch, -0.2);
        state.set_filtered(Axis::Yaw, 0.1);
        state.set_filtered(Axis::Throttle, 0.5);

        assert_eq!(gate.resolve(&state), GatedAxes::armed(0.3, -0.2, 0.1, 0.5));
    }

    #[test]
    fn test_resolve_applies_throttle_limit() {
        let gate = ArmingGate::new(0.05, 0.25, DisarmReset::Immediate);
        let mut state = state_with_throttle(0.0);
        gate.try_arm(&mut state).unwrap();
        state.set_filtered(Axis::Throttle, 1.0);

        assert_eq!(gate.resolve(&state).throttle, 0.25);
    }

    #[test]
    fn test_resolve_ignores_residual_filtered_when_disarmed() {
        let gate = ArmingGate::default();
        let mut state = ControlState::default();
        state.set_filtered(Axis::Roll, 1.0);
        state.set_filtered(Axis::Throttle, 1.0);

        assert_eq!(gate.resolve(&state), GatedAxes::SAFE);
    }
}
