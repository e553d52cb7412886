//! Fractional-position sample reader.
//!
//! Positions outside the buffer clamp to the nearest edge sample; wrapping
//! is the caller's business. Integer positions return the source sample
//! untouched in every quality mode.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Interpolation quality, in increasing cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Quality {
    /// Two-tap linear.
    Linear = 0,
    /// Four-tap Hermite.
    #[default]
    Cubic = 1,
    /// Eight-tap Hann-windowed sinc.
    Sinc = 2,
    /// 32-tap Hann-windowed sinc for offline or non-live use.
    SincHq = 3,
}

impl Quality {
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => Quality::Linear,
            2 => Quality::Sinc,
            3 => Quality::SincHq,
            _ => Quality::Cubic,
        }
    }

    /// Number of source samples read per output sample.
    pub fn taps(self) -> usize {
        match self {
            Quality::Linear => 2,
            Quality::Cubic => 4,
            Quality::Sinc => 8,
            Quality::SincHq => 32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quality::Linear => "Linear",
            Quality::Cubic => "Cubic",
            Quality::Sinc => "Sinc",
            Quality::SincHq => "Sinc HQ",
        }
    }
}

/// Reads one interpolated sample at a fractional position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resampler {
    quality: Quality,
}

impl Resampler {
    pub fn new(quality: Quality) -> Self {
        Self { quality }
    }

    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Sample `data` at `position`. `speed` widens the sinc kernel's
    /// anti-aliasing cutoff when reading faster than unity.
    #[inline]
    pub fn sample(&self, data: &[f32], position: f64, speed: f64) -> f32 {
        let len = data.len();
        if len == 0 || !position.is_finite() {
            return 0.0;
        }

        let pos = position.clamp(0.0, (len - 1) as f64);
        let idx = pos.floor() as usize;
        let frac = pos - idx as f64;
        if frac == 0.0 {
            return data[idx];
        }

        match self.quality {
            Quality::Linear => {
                let a = data[idx];
                let b = at(data, idx as isize + 1);
                a + (b - a) * frac as f32
            }
            Quality::Cubic => hermite(
                at(data, idx as isize - 1),
                data[idx],
                at(data, idx as isize + 1),
                at(data, idx as isize + 2),
                frac as f32,
            ),
            Quality::Sinc => windowed_sinc(data, idx, frac, 4, speed),
            Quality::SincHq => windowed_sinc(data, idx, frac, 16, speed),
        }
    }
}

#[inline]
fn at(data: &[f32], index: isize) -> f32 {
    let last = data.len() as isize - 1;
    data[index.clamp(0, last) as usize]
}

#[inline]
fn hermite(y0: f32, y1: f32, y2: f32, y3: f32, t: f32) -> f32 {
    let c0 = y1;
    let c1 = 0.5 * (y2 - y0);
    let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);
    ((c3 * t + c2) * t + c1) * t + c0
}

fn windowed_sinc(data: &[f32], idx: usize, frac: f64, half_width: isize, speed: f64) -> f32 {
    let speed = speed.abs();
    let cutoff = if speed > 1.0 { 1.0 / speed } else { 1.0 };

    let mut acc = 0.0f64;
    let mut weight = 0.0f64;
    for k in (1 - half_width)..=half_width {
        let x = k as f64 - frac;
        let u = x / half_width as f64;
        if u.abs() >= 1.0 {
            continue;
        }
        let window = 0.5 * (1.0 + (PI * u).cos());
        let kernel = cutoff * sinc(cutoff * x) * window;
        acc += at(data, idx as isize + k) as f64 * kernel;
        weight += kernel;
    }

    if weight.abs() > 1e-12 {
        (acc / weight) as f32
    } else {
        data[idx]
    }
}

#[inline]
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}
