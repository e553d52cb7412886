//! Capture bookkeeping: loop lengths, status codes and jobs passed from the
//! control context to the audio context.

use crate::SampleBuffer;
use std::ops::Range;
use std::sync::Arc;

/// Length in samples of `bars` bars at `tempo` BPM.
pub fn loop_length_samples(tempo: f64, bars: u32, beats_per_bar: u32, sample_rate: f64) -> usize {
    if !(tempo.is_finite() && tempo > 0.0) {
        return 0;
    }
    let beats = bars as f64 * beats_per_bar as f64;
    (beats * 60.0 / tempo * sample_rate).round() as usize
}

/// Record LED blink: lit for the first half of every beat.
#[inline]
pub fn should_blink_record_led(beat: f64) -> bool {
    beat.rem_euclid(1.0) < 0.5
}

/// Outcome of the most recent capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CaptureStatus {
    #[default]
    Idle = 0,
    /// Queued for the next audio block.
    Pending = 1,
    /// Loop captured and installed.
    Captured = 2,
    /// Not enough history yet; nothing was installed.
    InsufficientHistory = 3,
    /// The strip's sample slot or the job queue was busy.
    Busy = 4,
}

impl CaptureStatus {
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => Self::Pending,
            2 => Self::Captured,
            3 => Self::InsufficientHistory,
            4 => Self::Busy,
            _ => Self::Idle,
        }
    }
}

/// Absolute ring positions a capture read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// Audio immediately before the loop, blended into the loop tail.
    pub pre_roll: Range<u64>,
    pub loop_region: Range<u64>,
    /// Crossfade length actually applied.
    pub crossfade: usize,
}

/// A capture waiting for the audio context.
///
/// `buffer` is allocated on the control side with the final loop length and
/// must be uniquely owned so the audio context can fill it in place.
#[derive(Debug)]
pub struct CaptureJob {
    pub strip: usize,
    pub crossfade: usize,
    pub buffer: Arc<SampleBuffer>,
    /// Start the strip from column 0 once installed.
    pub trigger_after: bool,
}

impl CaptureJob {
    pub fn new(strip: usize, len: usize, num_channels: usize, sample_rate: f64) -> Self {
        Self {
            strip,
            crossfade: 0,
            buffer: Arc::new(SampleBuffer::silent(num_channels, len, sample_rate)),
            trigger_after: false,
        }
    }

    pub fn with_crossfade(mut self, samples: usize) -> Self {
        self.crossfade = samples;
        self
    }

    pub fn with_trigger(mut self, trigger: bool) -> Self {
        self.trigger_after = trigger;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
