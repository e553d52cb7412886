//! Planar in-memory sample storage and the loop-seam bake.

use crate::{Error, Result};
use stripline_dsp::{crossfade_progress, equal_power};

/// Immutable-once-shared planar audio.
///
/// Strips read it through an `Arc`; edits (bakes, captures) happen on a
/// private copy that is swapped in afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: f64,
}

impl SampleBuffer {
    /// Build from planar channels. All channels must share one length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: f64) -> Result<Self> {
        if channels.is_empty() {
            return Err(Error::InvalidBuffer("no channels".to_string()));
        }
        let len = channels[0].len();
        if let Some(bad) = channels.iter().position(|c| c.len() != len) {
            return Err(Error::InvalidBuffer(format!(
                "channel {} has {} samples, expected {}",
                bad,
                channels[bad].len(),
                len
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::Core(stripline_core::Error::InvalidSampleRate(
                sample_rate,
            )));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Zero-filled buffer, used to pre-allocate capture targets.
    pub fn silent(num_channels: usize, len: usize, sample_rate: f64) -> Self {
        Self {
            channels: vec![vec![0.0; len]; num_channels.max(1)],
            sample_rate,
        }
    }

    pub fn from_interleaved(data: &[f32], num_channels: usize, sample_rate: f64) -> Result<Self> {
        if num_channels == 0 {
            return Err(Error::InvalidBuffer("no channels".to_string()));
        }
        let frames = data.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in data.chunks_exact(num_channels) {
            for (ch, &s) in frame.iter().enumerate() {
                channels[ch].push(s);
            }
        }
        Self::new(channels, sample_rate)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.len() as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Channel `ch`, or the last channel when `ch` is past the end (mono feeds both sides).
    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        let idx = ch.min(self.channels.len().saturating_sub(1));
        self.channels.get(idx).map_or(&[], Vec::as_slice)
    }

    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> Option<&mut [f32]> {
        self.channels.get_mut(ch).map(Vec::as_mut_slice)
    }

    /// Stereo frame at `index`. Mono is duplicated.
    #[inline]
    pub fn frame(&self, index: usize) -> (f32, f32) {
        let l = self.channel(0).get(index).copied().unwrap_or(0.0);
        let r = self.channel(1).get(index).copied().unwrap_or(0.0);
        (l, r)
    }

    /// Bake a seamless seam into the loop `[start, end)` using the audio just
    /// before `start` as pre-roll, wrapping to the end of the sample when the
    /// loop starts near 0.
    ///
    /// The crossfade length is reduced to the audio outside the loop and to
    /// half the loop. Returns the length actually applied (0 means untouched).
    pub fn bake_loop_crossfade(&mut self, start: usize, end: usize, crossfade: usize) -> usize {
        let len = self.len();
        let end = end.min(len);
        if start >= end {
            return 0;
        }
        let c = crossfade.min(start + (len - end)).min((end - start) / 2);
        if c == 0 {
            return 0;
        }
        let seam = end - c;
        for data in &mut self.channels {
            let (head, rest) = data.split_at_mut(seam);
            let (tail, after) = rest.split_at_mut(c);
            bake_crossfade(tail, |i| {
                let j = (start + len - c + i) % len;
                if j < seam {
                    head[j]
                } else {
                    after[j - end]
                }
            });
        }
        c
    }
}

/// Blend `tail` (the last samples of a loop) into the pre-roll so the loop end
/// flows into the loop start.
///
/// `tail[i] = fade_out(t)·tail[i] + fade_in(t)·pre_roll(i)` with equal-power
/// gains and `t = i / (len − 1)`, so the final sample equals the pre-roll's
/// last sample, which is exactly what precedes the loop start.
pub fn bake_crossfade(tail: &mut [f32], pre_roll: impl Fn(usize) -> f32) {
    let len = tail.len();
    for (i, sample) in tail.iter_mut().enumerate() {
        let (fade_out, fade_in) = equal_power(crossfade_progress(i, len));
        *sample = fade_out * *sample + fade_in * pre_roll(i);
    }
}
