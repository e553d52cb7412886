//! Always-on input recorder.
//!
//! Every block of input is DC-blocked and appended to a ring buffer. A
//! capture copies the most recent loop-length of audio out of the ring and
//! blends the audio just before it into the loop tail, so the loop repeats
//! without a click.

mod capture;
mod ring;

pub use capture::{
    loop_length_samples, should_blink_record_led, CaptureJob, CaptureReport, CaptureStatus,
};
pub use ring::RingBuffer;

use crate::buffer::bake_crossfade;
use crate::{CaptureError, SampleBuffer};
use std::sync::Arc;
use stripline_core::{AtomicFlag, AtomicFloat, AtomicU64, AtomicU8, Ordering};
use stripline_dsp::DcBlocker;

pub const MIN_CROSSFADE_MS: f32 = 1.0;
pub const MAX_CROSSFADE_MS: f32 = 50.0;
pub const DEFAULT_CROSSFADE_MS: f32 = 10.0;

#[derive(Debug)]
struct RecorderShared {
    sample_rate: f64,
    capacity: usize,
    crossfade_ms: AtomicFloat,
    clear_pending: AtomicFlag,
    history: AtomicU64,
    status: AtomicU8,
}

/// Control-side view of the recorder.
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    shared: Arc<RecorderShared>,
}

impl RecorderHandle {
    /// Range: 1 to 50 ms.
    pub fn set_crossfade_ms(&self, ms: f32) -> f32 {
        self.shared
            .crossfade_ms
            .set_clamped(ms, MIN_CROSSFADE_MS, MAX_CROSSFADE_MS)
    }

    pub fn crossfade_ms(&self) -> f32 {
        self.shared.crossfade_ms.get()
    }

    /// Current crossfade length in samples.
    pub fn crossfade_samples(&self) -> usize {
        (self.crossfade_ms() as f64 * 0.001 * self.shared.sample_rate).round() as usize
    }

    /// Forget all history. Applied at the start of the next audio block.
    pub fn clear(&self) {
        self.shared.clear_pending.set(true);
    }

    pub fn history_len(&self) -> usize {
        self.shared.history.load(Ordering::Acquire) as usize
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn sample_rate(&self) -> f64 {
        self.shared.sample_rate
    }

    /// Fraction of the ring holding valid history, 0 to 1.
    pub fn recording_progress(&self) -> f32 {
        (self.history_len() as f64 / self.shared.capacity as f64).min(1.0) as f32
    }

    pub fn status(&self) -> CaptureStatus {
        CaptureStatus::from_u8(self.shared.status.load(Ordering::Acquire))
    }

    pub fn set_status(&self, status: CaptureStatus) {
        self.shared.status.store(status as u8, Ordering::Release);
    }
}

/// Audio-side recorder.
#[derive(Debug)]
pub struct ContinuousRecorder {
    ring: RingBuffer,
    blockers: Vec<DcBlocker>,
    shared: Arc<RecorderShared>,
}

impl ContinuousRecorder {
    pub fn new(num_channels: usize, capacity: usize, sample_rate: f64) -> Self {
        let ring = RingBuffer::new(num_channels, capacity);
        let blockers = (0..ring.num_channels())
            .map(|_| DcBlocker::new(sample_rate))
            .collect();
        let shared = Arc::new(RecorderShared {
            sample_rate,
            capacity: ring.capacity(),
            crossfade_ms: AtomicFloat::new(DEFAULT_CROSSFADE_MS),
            clear_pending: AtomicFlag::new(false),
            history: AtomicU64::new(0),
            status: AtomicU8::new(CaptureStatus::Idle as u8),
        });
        Self {
            ring,
            blockers,
            shared,
        }
    }

    pub fn handle(&self) -> RecorderHandle {
        RecorderHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.ring.num_channels()
    }

    #[inline]
    pub fn history_len(&self) -> usize {
        self.ring.valid_len()
    }

    #[inline]
    pub fn cursor(&self) -> u64 {
        self.ring.cursor()
    }

    pub fn sample_rate(&self) -> f64 {
        self.shared.sample_rate
    }

    /// Append one block. Channels missing from `input` repeat the last one
    /// given; no input at all records nothing.
    pub fn write(&mut self, input: &[&[f32]]) {
        if self.shared.clear_pending.swap(false) {
            self.ring.clear();
            for blocker in &mut self.blockers {
                blocker.reset();
            }
        }

        let Some(n) = input.iter().map(|c| c.len()).min() else {
            return;
        };
        let skip = n.saturating_sub(self.ring.capacity());
        if skip > 0 {
            self.ring.advance(skip);
        }
        for (ch, blocker) in self.blockers.iter_mut().enumerate() {
            let src = input[ch.min(input.len() - 1)];
            let blocked = src[..n].iter().map(|&x| blocker.process(x));
            if skip > 0 {
                // The ring already advanced past the skipped head.
                self.ring.write_channel(ch, blocked.skip(skip));
            } else {
                self.ring.write_channel(ch, blocked);
            }
        }
        self.ring.advance(n - skip);
        self.shared
            .history
            .store(self.ring.valid_len() as u64, Ordering::Release);
    }

    /// Copy the most recent `dest.len()` samples into `dest` and bake up to
    /// `crossfade` samples of pre-roll into its tail.
    ///
    /// The pre-roll is read from the samples just before the loop region and
    /// never overlaps it. Allocation-free.
    pub fn capture_into(
        &self,
        dest: &mut SampleBuffer,
        crossfade: usize,
    ) -> Result<CaptureReport, CaptureError> {
        let len = dest.len();
        if len == 0 {
            return Err(CaptureError::Empty);
        }
        let c = crossfade.min(len / 2);
        let needed = len + c;
        if needed > self.ring.capacity() {
            return Err(CaptureError::ExceedsCapacity {
                needed,
                capacity: self.ring.capacity(),
            });
        }
        let available = self.ring.valid_len();
        if needed > available {
            return Err(CaptureError::InsufficientHistory { needed, available });
        }

        let end = self.ring.cursor();
        let loop_start = end - len as u64;
        let pre_start = loop_start - c as u64;
        for ch in 0..dest.num_channels() {
            let Some(data) = dest.channel_mut(ch) else {
                continue;
            };
            self.ring.read_into(ch, loop_start, data);
            if c > 0 {
                let ring = &self.ring;
                bake_crossfade(&mut data[len - c..], |i| ring.at(ch, pre_start + i as u64));
            }
        }

        Ok(CaptureReport {
            pre_roll: pre_start..loop_start,
            loop_region: loop_start..end,
            crossfade: c,
        })
    }

    /// Allocating capture for use outside the audio context.
    pub fn capture(
        &self,
        len: usize,
        crossfade: usize,
    ) -> Result<(SampleBuffer, CaptureReport), CaptureError> {
        let mut buffer = SampleBuffer::silent(self.num_channels(), len, self.sample_rate());
        let report = self.capture_into(&mut buffer, crossfade)?;
        Ok((buffer, report))
    }

    /// Fill a job's pre-allocated buffer in place.
    pub fn fulfil(&self, job: &mut CaptureJob) -> Result<CaptureReport, CaptureError> {
        let crossfade = job.crossfade;
        let Some(dest) = Arc::get_mut(&mut job.buffer) else {
            return Err(CaptureError::DestinationShared);
        };
        self.capture_into(dest, crossfade)
    }
}
