//! Stateful gain ramp for de-clicking starts and stops.

use crate::crossfade::{crossfade_progress, CrossfadeCurve};

/// Moves a gain between its current value and 0 or 1 along a crossfade curve.
///
/// Restarting mid-ramp continues from the gain reached so far, so a stop
/// issued during a fade-in never jumps.
#[derive(Debug, Clone)]
pub struct FadeRamp {
    curve: CrossfadeCurve,
    gain: f32,
    from: f32,
    to: f32,
    index: usize,
    len: usize,
    active: bool,
}

impl FadeRamp {
    pub fn new(curve: CrossfadeCurve) -> Self {
        Self {
            curve,
            gain: 0.0,
            from: 0.0,
            to: 0.0,
            index: 0,
            len: 0,
            active: false,
        }
    }

    /// Ramp from the current gain towards 1 (`fade_in`) or 0 over `samples`.
    pub fn start(&mut self, fade_in: bool, samples: usize) {
        self.start_from(self.gain, fade_in, samples);
    }

    /// Ramp from `from` towards 1 (`fade_in`) or 0 over `samples`.
    pub fn start_from(&mut self, from: f32, fade_in: bool, samples: usize) {
        self.from = from;
        self.to = if fade_in { 1.0 } else { 0.0 };
        self.index = 0;
        self.len = samples;
        if samples == 0 {
            self.gain = self.to;
            self.active = false;
        } else {
            self.gain = from;
            self.active = true;
        }
    }

    /// Jump to `gain` and cancel any ramp in progress.
    pub fn set(&mut self, gain: f32) {
        self.gain = gain;
        self.to = gain;
        self.active = false;
    }

    /// Gain for the next sample.
    #[inline]
    pub fn next_gain(&mut self) -> f32 {
        if !self.active {
            return self.gain;
        }

        let (_, shape) = self.curve.gains(crossfade_progress(self.index, self.len));
        self.gain = self.from + (self.to - self.from) * shape;
        self.index += 1;
        if self.index >= self.len {
            self.gain = self.to;
            self.active = false;
        }
        self.gain
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True once a fade-out has finished.
    #[inline]
    pub fn is_silent(&self) -> bool {
        !self.active && self.gain <= 0.0
    }

    #[inline]
    pub fn is_fading_out(&self) -> bool {
        self.active && self.to <= 0.0
    }
}
