//! Block-rate musical clock.
//!
//! Host-synced blocks copy the host's beat position verbatim and never
//! accumulate locally; a stopped host simply leaves the position where it
//! was. There is no pause/resume state, so repeated stop/start cycles
//! cannot drift. Free-running blocks advance an internal accumulator.

use super::host::{ClockMode, HostTransport};
use super::quantize::{next_boundary, QuantizeDivision};
use crate::lockfree::{AtomicDouble, AtomicFlag};
use crate::{Arc, AtomicU32, AtomicU64, AtomicU8, Ordering};

pub const MIN_TEMPO: f64 = 20.0;
pub const MAX_TEMPO: f64 = 999.0;

/// Clock state readable from the control context.
#[derive(Debug)]
pub struct SharedClockState {
    requested_tempo: AtomicDouble,
    division: AtomicU32,
    reset_pending: AtomicFlag,
    tempo: AtomicDouble,
    beat: AtomicDouble,
    running: AtomicFlag,
    mode: AtomicU8,
    global_sample: AtomicU64,
}

impl SharedClockState {
    fn new(tempo: f64) -> Self {
        Self {
            requested_tempo: AtomicDouble::new(tempo),
            division: AtomicU32::new(QuantizeDivision::default().get()),
            reset_pending: AtomicFlag::new(false),
            tempo: AtomicDouble::new(tempo),
            beat: AtomicDouble::new(0.0),
            running: AtomicFlag::new(false),
            mode: AtomicU8::new(ClockMode::FreeRunning as u8),
            global_sample: AtomicU64::new(0),
        }
    }

    /// Set the internal tempo, clamped to 20..=999 BPM. Host tempo overrides it while present.
    pub fn set_tempo(&self, bpm: f64) -> f64 {
        let clamped = clamp_tempo(bpm).unwrap_or(self.requested_tempo.get());
        self.requested_tempo.set(clamped);
        clamped
    }

    pub fn requested_tempo(&self) -> f64 {
        self.requested_tempo.get()
    }

    pub fn set_quantization(&self, division: QuantizeDivision) {
        self.division.store(division.get(), Ordering::Release);
    }

    pub fn quantization(&self) -> QuantizeDivision {
        QuantizeDivision::new(self.division.load(Ordering::Acquire))
    }

    /// Rewind the free-running accumulator to beat 0 on the next block.
    pub fn request_reset(&self) {
        self.reset_pending.set(true);
    }

    /// Tempo in effect for the last processed block.
    pub fn tempo(&self) -> f64 {
        self.tempo.get()
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        let beat = self.beat.get();
        ClockSnapshot {
            tempo: self.tempo.get(),
            beat,
            beat_phase: beat.rem_euclid(1.0),
            running: self.running.get(),
            mode: ClockMode::from_u8(self.mode.load(Ordering::Acquire)),
            global_sample: self.global_sample.load(Ordering::Acquire),
        }
    }
}

/// Point-in-time copy of the clock published after each block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSnapshot {
    pub tempo: f64,
    pub beat: f64,
    pub beat_phase: f64,
    pub running: bool,
    pub mode: ClockMode,
    pub global_sample: u64,
}

fn clamp_tempo(bpm: f64) -> Option<f64> {
    (bpm.is_finite() && bpm > 0.0).then(|| bpm.clamp(MIN_TEMPO, MAX_TEMPO))
}

/// Audio-context clock. Call [`update`](MusicalClock::update) once at the
/// start of every block, before any strip reads it.
pub struct MusicalClock {
    sample_rate: f64,
    tempo: f64,
    beats_per_sample: f64,
    beats_per_bar: f64,
    block_start_beat: f64,
    next_free_beat: f64,
    block_len: usize,
    running: bool,
    mode: ClockMode,
    global_sample: u64,
    shared: Arc<SharedClockState>,
}

impl MusicalClock {
    pub fn new(sample_rate: f64, tempo: f64) -> Self {
        let tempo = clamp_tempo(tempo).unwrap_or(120.0);
        Self {
            sample_rate,
            tempo,
            beats_per_sample: (tempo / 60.0) / sample_rate,
            beats_per_bar: 4.0,
            block_start_beat: 0.0,
            next_free_beat: 0.0,
            block_len: 0,
            running: false,
            mode: ClockMode::FreeRunning,
            global_sample: 0,
            shared: Arc::new(SharedClockState::new(tempo)),
        }
    }

    pub fn with_beats_per_bar(mut self, beats: u32) -> Self {
        self.beats_per_bar = beats.max(1) as f64;
        self
    }

    /// Control-side view of this clock.
    pub fn shared(&self) -> Arc<SharedClockState> {
        Arc::clone(&self.shared)
    }

    #[inline]
    fn update_tempo_if_changed(&mut self, tempo: f64) {
        if (tempo - self.tempo).abs() > 1e-9 {
            self.tempo = tempo;
            self.beats_per_sample = (tempo / 60.0) / self.sample_rate;
        }
    }

    /// Latch the clock for a block of `num_samples`.
    pub fn update(&mut self, host: &HostTransport, num_samples: usize) {
        if self.shared.reset_pending.swap(false) {
            self.next_free_beat = 0.0;
            self.block_start_beat = 0.0;
        }

        let tempo = host
            .tempo
            .and_then(clamp_tempo)
            .unwrap_or_else(|| self.shared.requested_tempo.get());
        self.update_tempo_if_changed(tempo);

        self.mode = host.mode();
        self.running = host.is_playing;

        if let (ClockMode::HostSynced, Some(beat)) = (self.mode, host.musical_position) {
            if self.running {
                self.block_start_beat = beat;
            }
        } else {
            self.block_start_beat = self.next_free_beat;
        }

        self.block_len = num_samples;
        self.next_free_beat = self.beat_at_offset(num_samples);
        self.global_sample += num_samples as u64;
        self.publish();
    }

    fn publish(&self) {
        self.shared.tempo.set(self.tempo);
        self.shared.beat.set(self.block_start_beat);
        self.shared.running.set(self.running);
        self.shared.mode.store(self.mode as u8, Ordering::Release);
        self.shared
            .global_sample
            .store(self.global_sample, Ordering::Release);
    }

    /// Beat position at the first sample of the current block.
    #[inline]
    pub fn beat(&self) -> f64 {
        self.block_start_beat
    }

    /// Projected beat at `offset` samples into the current block.
    #[inline]
    pub fn beat_at_offset(&self, offset: usize) -> f64 {
        if self.running {
            self.block_start_beat + self.beats_per_sample * offset as f64
        } else {
            self.block_start_beat
        }
    }

    /// Sample offset in this block at which the projected beat reaches `target`.
    ///
    /// `None` while stopped or when the target lies beyond this block.
    pub fn offset_of_beat(&self, target: f64) -> Option<usize> {
        if !self.running || self.beats_per_sample <= 0.0 {
            return None;
        }
        let delta = target - self.block_start_beat;
        if delta <= 1e-9 {
            return Some(0);
        }
        let offset = (delta / self.beats_per_sample - 1e-9).ceil() as usize;
        (offset < self.block_len).then_some(offset)
    }

    /// First boundary of the current quantization grid at or after this block's start.
    pub fn next_boundary(&self, division: QuantizeDivision) -> f64 {
        next_boundary(self.block_start_beat, division.beats())
    }

    #[inline]
    pub fn quantization(&self) -> QuantizeDivision {
        self.shared.quantization()
    }

    #[inline]
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    #[inline]
    pub fn beats_per_sample(&self) -> f64 {
        self.beats_per_sample
    }

    #[inline]
    pub fn samples_per_beat(&self) -> f64 {
        self.sample_rate * 60.0 / self.tempo
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn beats_per_bar(&self) -> f64 {
        self.beats_per_bar
    }

    /// Position within the current beat, in `[0, 1)`.
    pub fn beat_phase(&self) -> f64 {
        self.block_start_beat.rem_euclid(1.0)
    }

    /// Position within the current bar, in `[0, 1)`.
    pub fn bar_phase(&self) -> f64 {
        (self.block_start_beat / self.beats_per_bar).rem_euclid(1.0)
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    #[inline]
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Samples processed since construction.
    #[inline]
    pub fn global_sample(&self) -> u64 {
        self.global_sample
    }
}
