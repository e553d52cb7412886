//! Peak level meter with exponential release.

use stripline_core::{Arc, AtomicFloat};

/// Tracks the block peak of one channel and publishes it lock-free.
pub struct PeakMeter {
    level: Arc<AtomicFloat>,
    held: f32,
    release_per_sample: f32,
}

impl PeakMeter {
    /// `release_secs` is the time for the held peak to fall by 60 dB.
    pub fn new(sample_rate: f64, release_secs: f64) -> Self {
        let samples = (release_secs * sample_rate).max(1.0);
        Self {
            level: Arc::new(AtomicFloat::new(0.0)),
            held: 0.0,
            release_per_sample: (0.001f64.ln() / samples).exp() as f32,
        }
    }

    /// Shared level read by the control context.
    pub fn shared(&self) -> Arc<AtomicFloat> {
        Arc::clone(&self.level)
    }

    pub fn process(&mut self, block: &[f32]) {
        let peak = block.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        let decayed = self.held * self.release_per_sample.powi(block.len() as i32);
        self.held = if peak >= decayed { peak } else { decayed };
        if self.held < 1e-6 {
            self.held = 0.0;
        }
        self.level.set(self.held);
    }

    pub fn level(&self) -> f32 {
        self.level.get()
    }

    pub fn reset(&mut self) {
        self.held = 0.0;
        self.level.set(0.0);
    }
}
