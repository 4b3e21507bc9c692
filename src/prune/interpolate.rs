//! Interpolation functions for ramping a value across an epoch window
//!
//! Given progress `x` in `[0, 1]` through the window, the ramped value is
//! `y0 + (y1 - y0) * f(x)`:
//!
//! - `linear`: `f(x) = x`
//! - `cubic`: `f(x) = 1 - (1 - x)^3`, fast early and slow near the target
//!   (Zhu & Gupta, 2017)
//! - `inverse_cubic`: `f(x) = x^3`, slow early and fast near the target

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of the ramp between the start and end of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationFunc {
    Linear,
    #[default]
    Cubic,
    InverseCubic,
}

impl InterpolationFunc {
    /// Map progress in `[0, 1]` to ramp fraction in `[0, 1]`.
    ///
    /// Progress outside the unit interval is clamped.
    pub fn apply(&self, progress: f64) -> f64 {
        let x = progress.clamp(0.0, 1.0);
        match self {
            InterpolationFunc::Linear => x,
            InterpolationFunc::Cubic => 1.0 - (1.0 - x).powi(3),
            InterpolationFunc::InverseCubic => x.powi(3),
        }
    }
}

impl fmt::Display for InterpolationFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationFunc::Linear => write!(f, "linear"),
            InterpolationFunc::Cubic => write!(f, "cubic"),
            InterpolationFunc::InverseCubic => write!(f, "inverse_cubic"),
        }
    }
}

/// Interpolate between `y0` at `x0` and `y1` at `x1`, evaluated at `x`.
///
/// Values of `x` before `x0` return `y0`, after `x1` return `y1`. A
/// degenerate window (`x1 <= x0`) jumps to `y1` at `x0`.
pub fn interpolate(x: f64, x0: f64, x1: f64, y0: f64, y1: f64, func: InterpolationFunc) -> f64 {
    if x <= x0 {
        return if x1 <= x0 && x >= x0 { y1 } else { y0 };
    }
    if x >= x1 {
        return y1;
    }
    let progress = (x - x0) / (x1 - x0);
    y0 + (y1 - y0) * func.apply(progress)
}
