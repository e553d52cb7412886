//! Complementary fade-out/fade-in gain curves.
//!
//! Every curve takes a progress ratio `t` in `[0, 1]` and returns
//! `(fade_out, fade_in)`. Endpoints are exact: `t = 0` gives `(1, 0)` and
//! `t = 1` gives `(0, 1)`, so a fade computed with [`crossfade_progress`]
//! leaves no trace of the outgoing material on its final sample.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Curve family for a crossfade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossfadeCurve {
    /// `cos`/`sin` quarter-wave; `fade_out² + fade_in² = 1` for all `t`.
    #[default]
    EqualPower,
    /// Hann half-wave; C¹-continuous at both ends, sums to 1 in amplitude.
    RaisedCosine,
}

impl CrossfadeCurve {
    #[inline]
    pub fn gains(self, t: f32) -> (f32, f32) {
        match self {
            CrossfadeCurve::EqualPower => equal_power(t),
            CrossfadeCurve::RaisedCosine => raised_cosine(t),
        }
    }
}

/// Equal-power gain pair for progress `t`.
#[inline]
pub fn equal_power(t: f32) -> (f32, f32) {
    if t <= 0.0 || t.is_nan() {
        return (1.0, 0.0);
    }
    if t >= 1.0 {
        return (0.0, 1.0);
    }
    let angle = t as f64 * FRAC_PI_2;
    (angle.cos() as f32, angle.sin() as f32)
}

/// Raised-cosine (Hann) gain pair for progress `t`.
#[inline]
pub fn raised_cosine(t: f32) -> (f32, f32) {
    if t <= 0.0 || t.is_nan() {
        return (1.0, 0.0);
    }
    if t >= 1.0 {
        return (0.0, 1.0);
    }
    let c = (PI * t as f64).cos();
    ((0.5 * (1.0 + c)) as f32, (0.5 * (1.0 - c)) as f32)
}

/// Progress of sample `index` within an `len`-sample crossfade: `index / (len - 1)`.
///
/// The last sample lands on exactly `1.0`. Fades of one sample or fewer
/// are complete immediately.
#[inline]
pub fn crossfade_progress(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }
    (index as f64 / (len - 1) as f64).min(1.0) as f32
}
