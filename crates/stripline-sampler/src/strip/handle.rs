//! Control-side view of a strip.
//!
//! Every parameter is an independent atomic so the audio context never waits
//! on a control write. The sample buffer sits behind a `parking_lot::Mutex`
//! that the audio context only ever `try_lock`s.

use super::mode::{PlayMode, StripStatus};
use crate::SampleBuffer;
use parking_lot::Mutex;
use stripline_core::{
    AtomicColumnRange, AtomicDouble, AtomicFlag, AtomicFloat, AtomicI64, AtomicU32, AtomicU64,
    AtomicU8, Ordering,
};
use stripline_dsp::Quality;
use std::sync::Arc;

pub(crate) const NO_COLUMN: i64 = -1;
const QUANTIZED_BIT: i64 = 1 << 32;
const CLEAR_LOOP_BIT: i64 = 1 << 33;

pub(crate) const STOP_NONE: u8 = 0;
pub(crate) const STOP_FADE: u8 = 1;
pub(crate) const STOP_IMMEDIATE: u8 = 2;

pub const DEFAULT_TRIGGER_FADE_SAMPLES: u32 = 128;
pub const DEFAULT_LOOP_CROSSFADE_MS: f32 = 10.0;
pub const DEFAULT_GRAIN_MS: f32 = 80.0;
pub const DEFAULT_STEP_COUNT: u32 = 16;
pub const MAX_STEPS: u32 = 64;

/// State shared between a [`StripHandle`] and its audio-side [`Strip`](super::Strip).
#[derive(Debug)]
pub(crate) struct StripShared {
    pub(crate) index: usize,
    pub(crate) num_columns: u32,
    pub(crate) sample_rate: f64,
    pub(crate) buffer: Mutex<Arc<SampleBuffer>>,
    pub(crate) loaded: AtomicFlag,

    pub(crate) volume: AtomicFloat,
    pub(crate) pan: AtomicFloat,
    pub(crate) speed: AtomicFloat,
    pub(crate) pitch: AtomicFloat,
    pub(crate) beats_per_loop: AtomicFloat,
    pub(crate) quality: AtomicU8,
    pub(crate) mode: AtomicU8,
    pub(crate) reverse: AtomicFlag,
    pub(crate) loop_range: AtomicColumnRange,
    pub(crate) baked_range: AtomicColumnRange,
    pub(crate) loop_crossfade_ms: AtomicFloat,
    pub(crate) trigger_fade_samples: AtomicU32,
    pub(crate) grain_ms: AtomicFloat,
    pub(crate) step_pattern: AtomicU64,
    pub(crate) step_count: AtomicU32,
    pub(crate) recording_bars: AtomicU32,

    pub(crate) pending_trigger: AtomicI64,
    pub(crate) stop_request: AtomicU8,
    pub(crate) release_column: AtomicI64,

    pub(crate) playing: AtomicFlag,
    pub(crate) awaiting_boundary: AtomicFlag,
    pub(crate) position: AtomicDouble,
    pub(crate) column: AtomicI64,
    pub(crate) status: AtomicU8,
}

impl StripShared {
    pub(crate) fn new(index: usize, num_columns: u32, sample_rate: f64) -> Self {
        let num_columns = num_columns.max(1);
        Self {
            index,
            num_columns,
            sample_rate,
            buffer: Mutex::new(Arc::new(SampleBuffer::default())),
            loaded: AtomicFlag::new(false),
            volume: AtomicFloat::new(1.0),
            pan: AtomicFloat::new(0.0),
            speed: AtomicFloat::new(1.0),
            pitch: AtomicFloat::new(0.0),
            beats_per_loop: AtomicFloat::new(0.0),
            quality: AtomicU8::new(Quality::default() as u8),
            mode: AtomicU8::new(PlayMode::default() as u8),
            reverse: AtomicFlag::new(false),
            loop_range: AtomicColumnRange::new(0, num_columns),
            baked_range: AtomicColumnRange::new(0, 0),
            loop_crossfade_ms: AtomicFloat::new(DEFAULT_LOOP_CROSSFADE_MS),
            trigger_fade_samples: AtomicU32::new(DEFAULT_TRIGGER_FADE_SAMPLES),
            grain_ms: AtomicFloat::new(DEFAULT_GRAIN_MS),
            step_pattern: AtomicU64::new(u64::MAX),
            step_count: AtomicU32::new(DEFAULT_STEP_COUNT),
            recording_bars: AtomicU32::new(1),
            pending_trigger: AtomicI64::new(NO_COLUMN),
            stop_request: AtomicU8::new(STOP_NONE),
            release_column: AtomicI64::new(NO_COLUMN),
            playing: AtomicFlag::new(false),
            awaiting_boundary: AtomicFlag::new(false),
            position: AtomicDouble::new(0.0),
            column: AtomicI64::new(NO_COLUMN),
            status: AtomicU8::new(StripStatus::Ok as u8),
        }
    }

    /// Pending trigger as `(column, quantized, clear_loop)`, consumed.
    #[inline]
    pub(crate) fn take_trigger(&self) -> Option<(u32, bool, bool)> {
        let raw = self.pending_trigger.swap(NO_COLUMN, Ordering::AcqRel);
        if raw < 0 {
            return None;
        }
        Some((
            (raw & 0xFFFF_FFFF) as u32,
            raw & QUANTIZED_BIT != 0,
            raw & CLEAR_LOOP_BIT != 0,
        ))
    }

    #[inline]
    pub(crate) fn take_stop(&self) -> u8 {
        self.stop_request.swap(STOP_NONE, Ordering::AcqRel)
    }

    #[inline]
    pub(crate) fn take_release(&self) -> Option<u32> {
        let raw = self.release_column.swap(NO_COLUMN, Ordering::AcqRel);
        (raw >= 0).then_some(raw as u32)
    }

    pub(crate) fn reset_loop(&self) {
        self.loop_range.set(0, self.num_columns);
        self.baked_range.set(0, 0);
        self.reverse.set(false);
    }

    /// Swap in a buffer produced by the audio context. Fails instead of
    /// blocking when the control context holds the slot.
    pub(crate) fn try_install(
        &self,
        buffer: Arc<SampleBuffer>,
    ) -> Result<Arc<SampleBuffer>, Arc<SampleBuffer>> {
        let Some(mut slot) = self.buffer.try_lock() else {
            return Err(buffer);
        };
        let old = std::mem::replace(&mut *slot, buffer);
        drop(slot);
        self.reset_loop();
        self.loaded.set(true);
        Ok(old)
    }
}

/// What a controller needs to light one strip's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StripLeds {
    pub playing: bool,
    /// Column under the playhead while playing.
    pub column: Option<u32>,
    pub inner_loop: Option<(u32, u32)>,
    pub reversed: bool,
    /// A quantized trigger is waiting for its boundary.
    pub awaiting_trigger: bool,
}

impl StripLeds {
    /// Per-column brightness: 0 off, 1 inside the inner loop, 2 playhead.
    pub fn row(&self, num_columns: u32) -> Vec<u8> {
        let mut row = vec![0u8; num_columns as usize];
        if let Some((start, end)) = self.inner_loop {
            for cell in row
                .iter_mut()
                .take(end.min(num_columns) as usize)
                .skip(start as usize)
            {
                *cell = 1;
            }
        }
        if let Some(col) = self.column {
            if let Some(cell) = row.get_mut(col as usize) {
                *cell = 2;
            }
        }
        row
    }
}

/// Cloneable control-side handle to one strip.
#[derive(Clone, Debug)]
pub struct StripHandle {
    pub(crate) shared: Arc<StripShared>,
}

impl StripHandle {
    pub(crate) fn new(shared: Arc<StripShared>) -> Self {
        Self { shared }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.shared.index
    }

    #[inline]
    pub fn num_columns(&self) -> u32 {
        self.shared.num_columns
    }

    // =========================================================================
    // Sample slot
    // =========================================================================

    /// Replace the sample, returning the previous one so the caller drops it
    /// outside the lock. Resets the inner loop and direction.
    pub fn load(&self, buffer: Arc<SampleBuffer>) -> Arc<SampleBuffer> {
        let loaded = !buffer.is_empty();
        let old = {
            let mut slot = self.shared.buffer.lock();
            std::mem::replace(&mut *slot, buffer)
        };
        self.shared.reset_loop();
        self.shared.loaded.set(loaded);
        self.shared.status.store(StripStatus::Ok as u8, Ordering::Release);
        tracing::debug!(strip = self.index(), loaded, "Strip sample replaced");
        old
    }

    pub fn clear_sample(&self) -> Arc<SampleBuffer> {
        self.stop(true);
        self.load(Arc::new(SampleBuffer::default()))
    }

    /// Current sample.
    pub fn buffer(&self) -> Arc<SampleBuffer> {
        Arc::clone(&self.shared.buffer.lock())
    }

    #[inline]
    pub fn has_sample(&self) -> bool {
        self.shared.loaded.get()
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Request playback from `column`. Returns false (and publishes
    /// [`StripStatus::NoSample`]) when nothing is loaded.
    pub fn trigger(&self, column: u32, quantized: bool) -> bool {
        self.request_trigger(column, quantized, false)
    }

    /// Like [`trigger`](Self::trigger), but the inner loop is cleared when
    /// the trigger fires rather than now, so a quantized clear lands on the
    /// grid. Without a sample the loop is cleared at once and false is
    /// returned.
    pub fn trigger_clearing_loop(&self, column: u32, quantized: bool) -> bool {
        if self.request_trigger(column, quantized, true) {
            return true;
        }
        self.clear_inner_loop();
        false
    }

    fn request_trigger(&self, column: u32, quantized: bool, clear_loop: bool) -> bool {
        if !self.has_sample() {
            self.shared
                .status
                .store(StripStatus::NoSample as u8, Ordering::Release);
            tracing::debug!(strip = self.index(), column, "Trigger ignored, no sample");
            return false;
        }
        let column = column.min(self.num_columns() - 1);
        let mut raw = column as i64;
        if quantized {
            raw |= QUANTIZED_BIT;
        }
        if clear_loop {
            raw |= CLEAR_LOOP_BIT;
        }
        self.shared.stop_request.store(STOP_NONE, Ordering::Release);
        self.shared.pending_trigger.store(raw, Ordering::Release);
        true
    }

    /// Stop playback and cancel any latched trigger.
    pub fn stop(&self, immediate: bool) {
        self.shared.pending_trigger.store(NO_COLUMN, Ordering::Release);
        let request = if immediate { STOP_IMMEDIATE } else { STOP_FADE };
        self.shared.stop_request.store(request, Ordering::Release);
    }

    /// Column released on the controller. Stops a Gate-mode strip held by it.
    pub fn release(&self, column: u32) {
        self.shared
            .release_column
            .store(column.min(self.num_columns() - 1) as i64, Ordering::Release);
    }

    /// Restrict playback to the column boundaries `first` and `second`.
    ///
    /// Boundaries run from 0 to `num_columns`. The range is normalized to
    /// `[min, max)` (equal boundaries select the single column `[c, c + 1)`),
    /// and playback runs backward when `first > second`. Returns the stored
    /// range.
    pub fn define_inner_loop(&self, first: u32, second: u32) -> (u32, u32) {
        let cols = self.num_columns();
        let (a, b) = (first.min(cols), second.min(cols));
        let end = if a == b { a + 1 } else { a.max(b) }.min(cols);
        let start = a.min(b).min(end - 1);
        self.shared.loop_range.set(start, end);
        self.shared.reverse.set(a > b);
        tracing::debug!(strip = self.index(), start, end, reversed = a > b, "Inner loop defined");
        (start, end)
    }

    /// Restore the full-sample range and forward direction.
    pub fn clear_inner_loop(&self) {
        self.shared.reset_loop();
    }

    /// The active inner loop, `None` when the whole sample is the region.
    pub fn inner_loop(&self) -> Option<(u32, u32)> {
        let (start, end) = self.shared.loop_range.get();
        (start != 0 || end != self.num_columns()).then_some((start, end))
    }

    /// Bake the pre-roll crossfade of the current inner loop into a copy of
    /// the sample and swap it in. Returns the crossfade length applied.
    pub fn bake_inner_loop(&self) -> usize {
        let Some((c0, c1)) = self.inner_loop() else {
            return 0;
        };
        let current = self.buffer();
        if current.is_empty() {
            return 0;
        }
        let (start, end) = column_span(c0, c1, current.len(), self.num_columns());
        let crossfade = ms_to_samples(self.loop_crossfade_ms(), current.sample_rate());
        let mut baked = (*current).clone();
        let applied = baked.bake_loop_crossfade(start, end, crossfade);
        if applied == 0 {
            return 0;
        }

        let old = {
            let mut slot = self.shared.buffer.lock();
            std::mem::replace(&mut *slot, Arc::new(baked))
        };
        self.shared.baked_range.set(c0, c1);
        drop(old);
        drop(current);
        tracing::debug!(strip = self.index(), start, end, applied, "Baked inner loop seam");
        applied
    }

    // =========================================================================
    // Parameters (clamped, never fail)
    // =========================================================================

    pub fn set_volume(&self, volume: f32) {
        self.shared.volume.set_clamped(volume, 0.0, 2.0);
    }

    pub fn volume(&self) -> f32 {
        self.shared.volume.get()
    }

    /// -1 hard left, 1 hard right.
    pub fn set_pan(&self, pan: f32) {
        self.shared.pan.set_clamped(pan, -1.0, 1.0);
    }

    pub fn pan(&self) -> f32 {
        self.shared.pan.get()
    }

    /// Negative speeds play backward.
    pub fn set_speed(&self, speed: f32) {
        self.shared.speed.set_clamped(speed, -4.0, 4.0);
    }

    pub fn speed(&self) -> f32 {
        self.shared.speed.get()
    }

    pub fn set_pitch(&self, semitones: f32) {
        self.shared.pitch.set_clamped(semitones, -24.0, 24.0);
    }

    pub fn pitch(&self) -> f32 {
        self.shared.pitch.get()
    }

    /// Stretch one pass of the whole sample over `beats` beats of the clock,
    /// replacing speed, pitch and sample-rate ratio. `None` disables sync.
    pub fn set_beats_per_loop(&self, beats: Option<f32>) {
        match beats {
            Some(b) => {
                self.shared.beats_per_loop.set_clamped(b, 0.25, 256.0);
            }
            None => self.shared.beats_per_loop.set(0.0),
        }
    }

    pub fn beats_per_loop(&self) -> Option<f32> {
        let beats = self.shared.beats_per_loop.get();
        (beats > 0.0).then_some(beats)
    }

    pub fn set_quality(&self, quality: Quality) {
        self.shared.quality.store(quality as u8, Ordering::Release);
    }

    pub fn quality(&self) -> Quality {
        Quality::from_u8(self.shared.quality.load(Ordering::Acquire))
    }

    pub fn set_play_mode(&self, mode: PlayMode) {
        self.shared.mode.store(mode as u8, Ordering::Release);
    }

    pub fn play_mode(&self) -> PlayMode {
        PlayMode::from_u8(self.shared.mode.load(Ordering::Acquire))
    }

    pub fn set_reverse(&self, reverse: bool) {
        self.shared.reverse.set(reverse);
    }

    pub fn is_reversed(&self) -> bool {
        self.shared.reverse.get()
    }

    /// Range: 1 to 50 ms.
    pub fn set_loop_crossfade_ms(&self, ms: f32) {
        self.shared.loop_crossfade_ms.set_clamped(ms, 1.0, 50.0);
    }

    pub fn loop_crossfade_ms(&self) -> f32 {
        self.shared.loop_crossfade_ms.get()
    }

    /// Range: 0.1 to 120 ms.
    pub fn set_trigger_fade_ms(&self, ms: f32) {
        let ms = if ms.is_nan() { 0.1 } else { ms.clamp(0.1, 120.0) };
        let samples = ms_to_samples(ms, self.shared.sample_rate).max(1) as u32;
        self.shared
            .trigger_fade_samples
            .store(samples, Ordering::Release);
    }

    pub fn trigger_fade_samples(&self) -> u32 {
        self.shared.trigger_fade_samples.load(Ordering::Acquire)
    }

    /// Range: 5 to 2400 ms.
    pub fn set_grain_ms(&self, ms: f32) {
        self.shared.grain_ms.set_clamped(ms, 5.0, 2400.0);
    }

    pub fn grain_ms(&self) -> f32 {
        self.shared.grain_ms.get()
    }

    /// Bit `i` enables step `i`; `steps` is clamped to 1..=64.
    pub fn set_step_pattern(&self, pattern: u64, steps: u32) {
        self.shared.step_pattern.store(pattern, Ordering::Release);
        self.shared
            .step_count
            .store(steps.clamp(1, MAX_STEPS), Ordering::Release);
    }

    pub fn step_pattern(&self) -> (u64, u32) {
        (
            self.shared.step_pattern.load(Ordering::Acquire),
            self.shared.step_count.load(Ordering::Acquire),
        )
    }

    /// Bars captured into this strip by the recorder. Range: 1 to 8.
    pub fn set_recording_bars(&self, bars: u32) {
        self.shared
            .recording_bars
            .store(bars.clamp(1, 8), Ordering::Release);
    }

    pub fn recording_bars(&self) -> u32 {
        self.shared.recording_bars.load(Ordering::Acquire)
    }

    // =========================================================================
    // Published state
    // =========================================================================

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.shared.playing.get()
    }

    /// Read position in source samples as of the last processed block.
    #[inline]
    pub fn position(&self) -> f64 {
        self.shared.position.get()
    }

    pub fn current_column(&self) -> Option<u32> {
        let col = self.shared.column.load(Ordering::Acquire);
        (col >= 0).then_some(col as u32)
    }

    /// A trigger has been requested but not yet fired.
    pub fn has_pending_trigger(&self) -> bool {
        self.shared.pending_trigger.load(Ordering::Acquire) != NO_COLUMN
            || self.shared.awaiting_boundary.get()
    }

    pub fn status(&self) -> StripStatus {
        StripStatus::from_u8(self.shared.status.load(Ordering::Acquire))
    }

    /// Read and reset the status.
    pub fn take_status(&self) -> StripStatus {
        StripStatus::from_u8(
            self.shared
                .status
                .swap(StripStatus::Ok as u8, Ordering::AcqRel),
        )
    }

    pub fn leds(&self) -> StripLeds {
        StripLeds {
            playing: self.is_playing(),
            column: self.current_column(),
            inner_loop: self.inner_loop(),
            reversed: self.is_reversed(),
            awaiting_trigger: self.has_pending_trigger(),
        }
    }

    pub fn led_row(&self) -> Vec<u8> {
        self.leds().row(self.num_columns())
    }
}

/// Sample bounds of columns `[c0, c1)` in a buffer of `len` samples.
#[inline]
pub(crate) fn column_span(c0: u32, c1: u32, len: usize, num_columns: u32) -> (usize, usize) {
    let cols = num_columns.max(1) as u64;
    let len = len as u64;
    let start = (c0 as u64).min(cols) * len / cols;
    let end = (c1 as u64).min(cols) * len / cols;
    (start as usize, end as usize)
}

#[inline]
pub(crate) fn ms_to_samples(ms: f32, sample_rate: f64) -> usize {
    (ms as f64 * sample_rate / 1000.0).round().max(0.0) as usize
}
