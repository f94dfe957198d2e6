//! # RC Link Library
//!
//! Fly a Betaflight quad from a gamepad over a serial RC link.
//!
//! Gamepad samples are normalized, smoothed and passed through an arming
//! gate into a shared control state. A fixed-rate transmitter encodes that
//! state as CRSF `RC_CHANNELS_PACKED` or MSP `SET_RAW_RC` frames and writes
//! them to the flight controller.
//!
//! ```text
//! InputBridge -> AxisFilter -> ArmingGate -> ControlState
//!                                                 |
//!                 serial <- FrameEncoder <- Transmitter (50 Hz)
//! ```

pub mod config;
pub mod error;
pub mod control;
pub mod crsf;
pub mod msp;
pub mod frame;
pub mod serial;
pub mod transmitter;
pub mod shutdown;
pub mod controller;
pub mod override_map;
