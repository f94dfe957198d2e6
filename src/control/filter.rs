//! # Axis Filter
//!
//! Turns raw device samples into normalized axis values and smooths them.
//!
//! ## Normalization
//!
//! ```text
//! delta = raw - center
//! |delta| < deadzone * half_range  ->  0.0
//! otherwise                        ->  clamp(delta / half_range, -1, 1), negated if inverted
//! ```
//!
//! Throttle is folded into 0..1: a stick via `(n + 1) / 2`, a trigger by its
//! natural `(raw - min) / (max - min)` scale.
//!
//! ## Low-pass filter
//!
//! Single-pole IIR, `filtered' = alpha * new + (1 - alpha) * filtered`.
//!
//! ```
//! use rc_link::control::filter::{normalize, LowPassFilter};
//!
//! // Inside the 5% deadzone
//! assert_eq!(normalize(130, 127.5, 127.5, 0.05, false), 0.0);
//!
//! let lpf = LowPassFilter::new(0.25);
//! assert_eq!(lpf.apply(1.0, 0.0), 0.25);
//! ```

use super::axis::{Axis, AxisInfo, AxisKind, RawSample};

/// Default filter coefficient.
pub const DEFAULT_ALPHA: f32 = 0.25;

/// Default stick deadzone as a fraction of the half range.
pub const DEFAULT_DEADZONE: f32 = 0.05;

/// Normalizes a centered raw reading into -1.0..=1.0.
///
/// Returns exactly `0.0` inside the deadzone and for a degenerate
/// (non-positive) half range.
#[must_use]
pub fn normalize(raw: i32, center: f32, half_range: f32, deadzone: f32, invert: bool) -> f32 {
    if !(half_range > 0.0) {
        return 0.0;
    }

    let delta = raw as f32 - center;
    if delta.abs() < deadzone * half_range {
        return 0.0;
    }

    let n = (delta / half_range).clamp(-1.0, 1.0);
    if invert {
        -n
    } else {
        n
    }
}

/// Normalizes a trigger reading into 0.0..=1.0 (min = 0.0).
#[must_use]
pub fn normalize_trigger(raw: i32, min: i32, max: i32, invert: bool) -> f32 {
    let span = max as f32 - min as f32;
    if !(span > 0.0) {
        return 0.0;
    }

    let n = ((raw as f32 - min as f32) / span).clamp(0.0, 1.0);
    if invert {
        1.0 - n
    } else {
        n
    }
}

/// Deadzone and normalization settings for incoming samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisFilter {
    deadzone: f32,
}

impl Default for AxisFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DEADZONE)
    }
}

impl AxisFilter {
    /// Creates a filter with the given deadzone fraction (clamped to 0.0..0.5).
    #[must_use]
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone: deadzone.clamp(0.0, 0.5),
        }
    }

    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    /// Normalizes a sample into its axis domain.
    ///
    /// Roll, pitch and yaw land in -1.0..=1.0, throttle in 0.0..=1.0.
    #[must_use]
    pub fn normalize_sample(&self, sample: &RawSample, info: &AxisInfo) -> f32 {
        match (sample.axis, info.kind) {
            (Axis::Throttle, AxisKind::Trigger) => {
                normalize_trigger(sample.value, info.min, info.max, sample.invert)
            }
            (Axis::Throttle, AxisKind::Stick) => {
                let n = normalize(
                    sample.value,
                    info.center(),
                    info.half_range(),
                    self.deadzone,
                    sample.invert,
                );
                ((n + 1.0) / 2.0).clamp(0.0, 1.0)
            }
            _ => normalize(
                sample.value,
                info.center(),
                info.half_range(),
                self.deadzone,
                sample.invert,
            ),
        }
    }
}

/// First-order low-pass filter applied per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPassFilter {
    alpha: f32,
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl LowPassFilter {
    /// Creates a filter with coefficient `alpha`, clamped to 0.0..=1.0.
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// One filter step.
    #[inline]
    #[must_use]
    pub fn apply(&self, new: f32, old: f32) -> f32 {
        self.alpha * new + (1.0 - self.alpha) * old
    }

    /// Steps all four axes together so the filtered vector stays time-aligned.
    pub fn apply_all(&self, raw: &[f32; 4], filtered: &mut [f32; 4]) {
        for (f, &r) in filtered.iter_mut().zip(raw.iter()) {
            *f = self.apply(r, *f);
        }
    }
}
