//! Strips: one sample each, triggered by column, looped by column range.
//!
//! A strip is split in two. [`StripHandle`] lives on the control side and
//! only writes atomics. [`Strip`] lives in the audio context, owns the
//! playhead and renders into the mix.
//!
//! ```
//! use stripline_core::{HostTransport, MusicalClock};
//! use stripline_sampler::{SampleBuffer, Strip};
//! use std::sync::Arc;
//!
//! let (mut strip, handle) = Strip::new(0, 16, 48000.0);
//! handle.load(Arc::new(SampleBuffer::new(vec![vec![0.5; 1600]], 48000.0).unwrap()));
//! handle.trigger(4, false);
//!
//! let mut clock = MusicalClock::new(48000.0, 120.0);
//! clock.update(&HostTransport::free_running(), 64);
//! let (mut l, mut r) = ([0.0f32; 64], [0.0f32; 64]);
//! strip.process(&clock, 1.0, &mut l, &mut r);
//! assert!(handle.is_playing());
//! ```

mod handle;
mod mode;
mod voice;

pub use handle::{
    StripHandle, StripLeds, DEFAULT_GRAIN_MS, DEFAULT_LOOP_CROSSFADE_MS, DEFAULT_STEP_COUNT,
    DEFAULT_TRIGGER_FADE_SAMPLES, MAX_STEPS,
};
pub use mode::{PlayMode, StripStatus};
pub use voice::STEP_BEATS;

use crate::speed::{semitones_to_ratio, PlayDirection, Varispeed};
use crate::SampleBuffer;
use handle::{
    column_span, ms_to_samples, StripShared, NO_COLUMN, STOP_FADE, STOP_IMMEDIATE, STOP_NONE,
};
use std::sync::Arc;
use stripline_core::{MusicalClock, Ordering, SmoothedValue};
use stripline_dsp::Quality;
use voice::{BlockParams, Voice};

const GAIN_SMOOTHING_SECS: f32 = 0.005;

#[derive(Debug, Clone, Copy)]
struct LatchedTrigger {
    column: u32,
    quantized: bool,
    /// Restore the full-sample range when the trigger fires.
    clear_loop: bool,
    /// Beat the trigger fires on, fixed the first block the clock runs.
    target: Option<f64>,
}

/// Audio-side strip.
pub struct Strip {
    shared: Arc<StripShared>,
    voice: Voice,
    latched: Option<LatchedTrigger>,
    gate_column: Option<u32>,
    gain_left: SmoothedValue,
    gain_right: SmoothedValue,
}

impl Strip {
    pub fn new(index: usize, num_columns: u32, sample_rate: f64) -> (Self, StripHandle) {
        let shared = Arc::new(StripShared::new(index, num_columns, sample_rate));
        let handle = StripHandle::new(Arc::clone(&shared));
        let strip = Self {
            shared,
            voice: Voice::new(),
            latched: None,
            gate_column: None,
            gain_left: SmoothedValue::new(1.0, GAIN_SMOOTHING_SECS, sample_rate as f32),
            gain_right: SmoothedValue::new(1.0, GAIN_SMOOTHING_SECS, sample_rate as f32),
        };
        (strip, handle)
    }

    pub fn handle(&self) -> StripHandle {
        StripHandle::new(Arc::clone(&self.shared))
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.shared.index
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.voice.is_playing()
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.voice.position()
    }

    /// Install a buffer from the audio context without blocking.
    ///
    /// Returns the replaced buffer, or the offered one back when the control
    /// context currently holds the slot.
    pub fn try_install(
        &mut self,
        buffer: Arc<SampleBuffer>,
    ) -> std::result::Result<Arc<SampleBuffer>, Arc<SampleBuffer>> {
        let old = self.shared.try_install(buffer)?;
        self.voice.stop(true, 0);
        self.latched = None;
        Ok(old)
    }

    /// Render one block, adding into `out_l`/`out_r` scaled by `mix_gain`.
    ///
    /// Returns the offset at which a trigger fired in this block, if any.
    pub fn process(
        &mut self,
        clock: &MusicalClock,
        mix_gain: f32,
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) -> Option<usize> {
        let n = out_l.len().min(out_r.len());
        let stop = self.apply_commands();

        let Some(slot) = self.shared.buffer.try_lock() else {
            self.publish(None);
            return None;
        };
        let buffer: &SampleBuffer = &slot;

        if buffer.is_empty() {
            self.voice.stop(true, 0);
            self.latched = None;
            drop(slot);
            self.publish(Some(0));
            return None;
        }

        let Some(mut params) = resolve_params(&self.shared, buffer, clock) else {
            self.voice.stop(true, 0);
            self.latched = None;
            drop(slot);
            self.shared
                .status
                .store(StripStatus::Fault as u8, Ordering::Release);
            self.publish(Some(0));
            return None;
        };

        if stop != STOP_NONE {
            self.voice
                .stop(stop == STOP_IMMEDIATE, params.trigger_fade);
        }

        self.voice
            .resampler_mut()
            .set_quality(Quality::from_u8(self.shared.quality.load(Ordering::Acquire)));

        let fire_at = self.latched.as_mut().and_then(|latched| {
            if !latched.quantized {
                return Some(0);
            }
            if !clock.is_running() {
                return None;
            }
            let target = *latched
                .target
                .get_or_insert_with(|| clock.next_boundary(clock.quantization()));
            clock.offset_of_beat(target)
        });
        let pending = self.latched;

        let (gl, gr) = pan_gains(self.shared.pan.get());
        let volume = self.shared.volume.get() * mix_gain;
        self.gain_left.set_target(volume * gl);
        self.gain_right.set_target(volume * gr);

        let left = buffer.channel(0);
        let right = buffer.channel(1);
        for k in 0..n {
            if fire_at == Some(k) {
                if let Some(latched) = pending {
                    if latched.clear_loop {
                        self.shared.reset_loop();
                        if let Some(full) = resolve_params(&self.shared, buffer, clock) {
                            params = full;
                        }
                    }
                    self.voice.fire(latched.column, &params);
                    self.gate_column = (params.mode == PlayMode::Gate).then_some(latched.column);
                    self.latched = None;
                }
            }
            let (l, r) = self
                .voice
                .render(left, right, &params, clock.beat_at_offset(k));
            out_l[k] += l * self.gain_left.next_sample();
            out_r[k] += r * self.gain_right.next_sample();
        }
        let len = buffer.len();
        drop(slot);

        if self.voice.take_fault() {
            self.shared
                .status
                .store(StripStatus::Fault as u8, Ordering::Release);
        }
        self.publish(Some(len));
        fire_at
    }

    /// Consume control requests. Returns the stop request for this block.
    fn apply_commands(&mut self) -> u8 {
        if let Some((column, quantized, clear_loop)) = self.shared.take_trigger() {
            self.latched = Some(LatchedTrigger {
                column,
                quantized,
                clear_loop,
                target: None,
            });
        }

        let stop = self.shared.take_stop();
        if stop != STOP_NONE {
            self.latched = None;
            self.gate_column = None;
        }

        if let Some(column) = self.shared.take_release() {
            if self.latched.is_some_and(|l| l.column == column)
                && PlayMode::from_u8(self.shared.mode.load(Ordering::Acquire)) == PlayMode::Gate
            {
                self.latched = None;
            }
            if self.gate_column == Some(column) {
                self.gate_column = None;
                return stop.max(STOP_FADE);
            }
        }
        stop
    }

    /// Publish playhead state. `buffer_len` is `None` when the sample slot
    /// was contended this block; the column is then left as it was.
    fn publish(&self, buffer_len: Option<usize>) {
        let shared = &self.shared;
        let playing = self.voice.is_playing();
        shared.playing.set(playing);
        shared.awaiting_boundary.set(self.latched.is_some());
        shared.position.set(self.voice.position());

        let Some(len) = buffer_len else {
            return;
        };
        let cols = shared.num_columns as u64;
        let column = if playing && len > 0 {
            let col = self.voice.position().max(0.0) as u64 * cols / len as u64;
            col.min(cols - 1) as i64
        } else {
            NO_COLUMN
        };
        shared.column.store(column, Ordering::Release);
    }
}

/// Left/right gains for a balance pan: unity at center, the far side
/// attenuated linearly.
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    ((1.0 - pan).min(1.0), (1.0 + pan).min(1.0))
}

fn resolve_params(
    shared: &StripShared,
    buffer: &SampleBuffer,
    clock: &MusicalClock,
) -> Option<BlockParams> {
    let len = buffer.len();
    let cols = shared.num_columns;
    let (c0, c1) = shared.loop_range.get();
    if c0 >= c1 || c1 > cols {
        return None;
    }
    let (start, end) = column_span(c0, c1, len, cols);
    if end <= start {
        return None;
    }

    let mode = PlayMode::from_u8(shared.mode.load(Ordering::Acquire));
    let direction = if mode == PlayMode::Reverse || shared.reverse.get() {
        PlayDirection::Reverse
    } else {
        PlayDirection::Forward
    };
    let varispeed = Varispeed::new(shared.speed.get(), direction);
    let beats_per_loop = shared.beats_per_loop.get();
    let magnitude = if beats_per_loop > 0.0 {
        len as f64 / (beats_per_loop as f64 * clock.samples_per_beat())
    } else {
        varispeed.effective_speed() as f64
            * semitones_to_ratio(shared.pitch.get())
            * buffer.sample_rate()
            / clock.sample_rate()
    };
    let step = magnitude * varispeed.resolved_direction().sign();

    let inner_loop = c0 != 0 || c1 != cols;
    let crossfade = if inner_loop && mode.wraps() && shared.baked_range.get() != (c0, c1) {
        ms_to_samples(shared.loop_crossfade_ms.get(), buffer.sample_rate())
    } else {
        0
    };
    // The seam borrows audio outside the loop, wrapping past either end of
    // the sample.
    let outside = start + (len - end);
    let half = (end - start) / 2;
    let loop_len = (end - start) as f64;

    Some(BlockParams {
        len,
        num_columns: cols,
        start,
        end,
        mode,
        step,
        seam_crossfade: crossfade.min(outside).min(half),
        trigger_fade: shared.trigger_fade_samples.load(Ordering::Acquire) as usize,
        grain_len: (shared.grain_ms.get() as f64 * 0.001 * buffer.sample_rate())
            .max(2.0)
            .min(loop_len),
        step_pattern: shared.step_pattern.load(Ordering::Acquire),
        step_count: shared.step_count.load(Ordering::Acquire),
    })
}
