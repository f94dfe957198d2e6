//! # Control Module
//!
//! Everything between a raw gamepad sample and the values an encoder sees.
//!
//! This module handles:
//! - Axis normalization with deadzone (`filter`)
//! - Low-pass smoothing of all four axes (`filter`)
//! - The arm/disarm safety gate (`arming`)
//! - The lock-guarded shared state and its input entry points (`state`)

pub mod axis;
pub mod filter;
pub mod arming;
pub mod state;

pub use arming::{ArmRefusal, ArmState, ArmingGate, DisarmReset, GatedAxes};
pub use axis::{Axis, AxisInfo, AxisKind, RawSample};
pub use state::{Button, ButtonBindings, ControlEvent, ControlHandle, ControlSettings, ControlState};
