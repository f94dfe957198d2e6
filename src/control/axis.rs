//! # Flight Axes
//!
//! The four control axes and the raw-sample types the input side hands in.
//!
//! | Axis | Domain | Rest |
//! |------|--------|------|
//! | Roll | -1.0..=1.0 | 0.0 |
//! | Pitch | -1.0..=1.0 | 0.0 |
//! | Yaw | -1.0..=1.0 | 0.0 |
//! | Throttle | 0.0..=1.0 | 0.0 |

use serde::Deserialize;

/// A flight-control axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Roll,
    Pitch,
    Yaw,
    Throttle,
}

impl Axis {
    /// All axes in storage order.
    pub const ALL: [Axis; 4] = [Axis::Roll, Axis::Pitch, Axis::Yaw, Axis::Throttle];

    /// Index into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::Roll => 0,
            Axis::Pitch => 1,
            Axis::Yaw => 2,
            Axis::Throttle => 3,
        }
    }

    /// Lower bound of the normalized domain.
    #[inline]
    pub const fn min(self) -> f32 {
        match self {
            Axis::Throttle => 0.0,
            _ => -1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Roll => "roll",
            Axis::Pitch => "pitch",
            Axis::Yaw => "yaw",
            Axis::Throttle => "throttle",
        }
    }
}

/// Physical kind of the device axis an [`Axis`] is bound to.
///
/// Only matters for throttle: a self-centering stick is remapped from
/// -1..1 into 0..1, a trigger already rests at its minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    #[default]
    Stick,
    Trigger,
}

/// Device-reported range of an input axis plus how it is bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisInfo {
    /// Minimum raw value reported by the device.
    pub min: i32,
    /// Maximum raw value reported by the device.
    pub max: i32,
    /// Stick or trigger.
    pub kind: AxisKind,
    /// Flip the sign of the normalized value.
    pub invert: bool,
}

impl AxisInfo {
    /// Stick axis with the given range.
    #[must_use]
    pub fn stick(min: i32, max: i32) -> Self {
        Self {
            min,
            max,
            kind: AxisKind::Stick,
            invert: false,
        }
    }

    /// Trigger axis with the given range.
    #[must_use]
    pub fn trigger(min: i32, max: i32) -> Self {
        Self {
            min,
            max,
            kind: AxisKind::Trigger,
            invert: false,
        }
    }

    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    /// Midpoint of the raw range.
    #[inline]
    pub fn center(&self) -> f32 {
        (self.min as f32 + self.max as f32) / 2.0
    }

    /// Distance from center to either end of the raw range.
    #[inline]
    pub fn half_range(&self) -> f32 {
        (self.max as f32 - self.min as f32) / 2.0
    }
}

/// One raw device reading bound to an axis. Consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub axis: Axis,
    pub value: i32,
    pub invert: bool,
}
