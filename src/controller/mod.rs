//! # Controller Module
//!
//! Gamepad input via evdev.
//!
//! This module handles:
//! - Finding and opening the gamepad event node (`gamepad`)
//! - Reading per-axis ranges from the kernel (`gamepad`)
//! - Mapping axes and buttons to control events on a dedicated thread (`bridge`)

pub mod gamepad;
pub mod bridge;

pub use bridge::InputBridge;
pub use gamepad::Gamepad;
