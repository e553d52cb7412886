//! Single-pole DC blocking high-pass.

use std::f64::consts::TAU;

/// Pole frequency of the blocker.
pub const DC_BLOCKER_CUTOFF_HZ: f64 = 5.0;

/// `y[n] = x[n] - x[n-1] + R * y[n-1]`, one instance per channel.
#[derive(Debug, Clone)]
pub struct DcBlocker {
    r: f32,
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_cutoff(sample_rate, DC_BLOCKER_CUTOFF_HZ)
    }

    pub fn with_cutoff(sample_rate: f64, cutoff_hz: f64) -> Self {
        let r = (-TAU * cutoff_hz / sample_rate.max(1.0)).exp();
        Self {
            r: r as f32,
            x1: 0.0,
            y1: 0.0,
        }
    }

    #[inline]
    pub fn coefficient(&self) -> f32 {
        self.r
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = x - self.x1 + self.r * self.y1;
        self.x1 = x;
        // Flush denormals on silence
        self.y1 = if y.abs() < 1e-20 { 0.0 } else { y };
        self.y1
    }

    /// Filter `input` into `output`; lengths must match.
    #[inline]
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.process(*x);
        }
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}
