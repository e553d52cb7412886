//! Quantization grid for deferred triggers.

use serde::{Deserialize, Serialize};

/// Divisions offered by a ten-position quantize selector.
pub const QUANTIZE_CHOICES: [u32; 10] = [1, 2, 3, 4, 6, 8, 12, 16, 24, 32];

const BOUNDARY_EPSILON: f64 = 1e-6;

/// Subdivisions per whole note, clamped to 1..=32.
///
/// One subdivision spans `4 / division` beats, so 4 is quarter notes and
/// 16 is sixteenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuantizeDivision(u32);

impl QuantizeDivision {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 32;

    pub fn new(division: u32) -> Self {
        Self(division.clamp(Self::MIN, Self::MAX))
    }

    /// Division for a selector index; out-of-range indices give the default.
    pub fn from_choice(index: usize) -> Self {
        QUANTIZE_CHOICES
            .get(index)
            .map(|&d| Self(d))
            .unwrap_or_default()
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Grid spacing in beats.
    #[inline]
    pub fn beats(self) -> f64 {
        4.0 / self.0 as f64
    }
}

impl Default for QuantizeDivision {
    fn default() -> Self {
        Self(8)
    }
}

/// First grid point at or after `beat`.
///
/// A beat within 1e-6 of a grid point counts as on it. The result is
/// snapped to an exact multiple of `grid_beats`.
pub fn next_boundary(beat: f64, grid_beats: f64) -> f64 {
    if grid_beats <= 0.0 || !grid_beats.is_finite() {
        return beat;
    }
    let index = ((beat - BOUNDARY_EPSILON) / grid_beats).ceil();
    index * grid_beats
}
