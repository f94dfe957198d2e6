//! # RC Override
//!
//! RC-override values for command-protocol links.
//!
//! Same channel mapping the MSP encoder uses, but as four named pulse
//! widths for an RC-override message instead of a raw serial frame.

use crate::control::{ArmRefusal, ControlHandle, GatedAxes};
use crate::msp::encoder::{stick_to_msp, throttle_to_msp};
use crate::msp::protocol::{MSP_CHANNEL_VALUE_CENTER, MSP_CHANNEL_VALUE_MIN};

/// Pulse widths in microseconds, each within 1000..=2000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcOverride {
    pub roll: u16,
    pub pitch: u16,
    pub yaw: u16,
    pub throttle: u16,
}

impl RcOverride {
    pub const SAFE: RcOverride = RcOverride {
        roll: MSP_CHANNEL_VALUE_CENTER,
        pitch: MSP_CHANNEL_VALUE_CENTER,
        yaw: MSP_CHANNEL_VALUE_CENTER,
        throttle: MSP_CHANNEL_VALUE_MIN,
    };

    /// Roll, pitch, throttle, yaw: the order override messages carry them.
    pub fn channels(&self) -> [u16; 4] {
        [self.roll, self.pitch, self.throttle, self.yaw]
    }
}

/// Maps gated axes to override values. Disarmed gives [`RcOverride::SAFE`].
pub fn rc_override(axes: &GatedAxes) -> RcOverride {
    if !axes.armed {
        return RcOverride::SAFE;
    }

    RcOverride {
        roll: stick_to_msp(axes.roll),
        pitch: stick_to_msp(axes.pitch),
        yaw: stick_to_msp(axes.yaw),
        throttle: throttle_to_msp(axes.throttle),
    }
}

/// Checks the arm precondition before an arm command is sent.
///
/// Does not change local state; the remote side arms on the command.
pub fn request_arm(control: &ControlHandle) -> Result<(), ArmRefusal> {
    control.gate().check_arm(&control.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Axis, AxisInfo, ControlSettings};
    use crate::shutdown::Shutdown;

    #[test]
    fn test_disarmed_is_safe() {
        assert_eq!(rc_override(&GatedAxes::SAFE), RcOverride::SAFE);
        assert_eq!(RcOverride::SAFE.channels(), [1500, 1500, 1000, 1500]);

        let mut axes = GatedAxes::armed(1.0, 1.0, 1.0, 1.0);
        axes.armed = false;
        assert_eq!(rc_override(&axes), RcOverride::SAFE);
    }

    #[test]
    fn test_armed_mapping() {
        let o = rc_override(&GatedAxes::armed(0.5, -1.0, 0.0, 0.75));
        assert_eq!(o.roll, 1750);
        assert_eq!(o.pitch, 1000);
        assert_eq!(o.yaw, 1500);
        assert_eq!(o.throttle, 1750);
    }

    #[test]
    fn test_clamped() {
        let o = rc_override(&GatedAxes::armed(5.0, -5.0, f32::NAN, 3.0));
        assert_eq!(o.roll, 2000);
        assert_eq!(o.pitch, 1000);
        assert_eq!(o.yaw, 1500);
        assert_eq!(o.throttle, 2000);
    }

    #[test]
    fn test_request_arm_uses_throttle_precondition() {
        let control = ControlHandle::new(ControlSettings::default(), Shutdown::new());
        assert!(request_arm(&control).is_ok());

        let trigger = AxisInfo::trigger(0, 255);
        for _ in 0..10 {
            control.on_axis(Axis::Throttle, 255, &trigger);
        }
        assert!(request_arm(&control).is_err());
        // Local state untouched either way
        assert!(!control.snapshot().arm_state().is_armed());
    }
}
