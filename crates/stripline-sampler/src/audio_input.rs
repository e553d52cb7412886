//! Live input bridge from an input device callback into the audio context.
//!
//! Frames travel through a bounded crossbeam channel. Both ends use the
//! non-blocking `try_*` calls, so neither callback ever waits on the other.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::Arc;
use stripline_core::{AtomicFloat, AtomicU32, Ordering};

/// Producer half, handed to the input device callback.
#[derive(Clone)]
pub struct InputSender {
    tx: Sender<(f32, f32)>,
    dropped: Arc<AtomicU32>,
    peak: Arc<AtomicFloat>,
}

impl InputSender {
    /// Queue one frame. Frames are dropped (and counted) when the consumer
    /// falls behind.
    #[inline]
    pub fn push(&self, left: f32, right: f32) -> bool {
        match self.tx.try_send((left, right)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Queue a block of planar frames, tracking its peak.
    pub fn push_block(&self, left: &[f32], right: &[f32]) {
        let mut peak = 0.0f32;
        for (&l, &r) in left.iter().zip(right) {
            peak = peak.max(l.abs()).max(r.abs());
            self.push(l, r);
        }
        self.peak.set(peak);
    }
}

/// Consumer half, polled from the audio context.
pub struct AudioInput {
    rx: Receiver<(f32, f32)>,
    sender: Option<InputSender>,
    dropped: Arc<AtomicU32>,
    peak: Arc<AtomicFloat>,
}

impl AudioInput {
    pub fn new(capacity_frames: usize) -> Self {
        let (tx, rx) = bounded(capacity_frames.max(1));
        let dropped = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicFloat::new(0.0));
        let sender = InputSender {
            tx,
            dropped: Arc::clone(&dropped),
            peak: Arc::clone(&peak),
        };
        Self {
            rx,
            sender: Some(sender),
            dropped,
            peak,
        }
    }

    /// The producer half. Available once.
    pub fn take_sender(&mut self) -> Option<InputSender> {
        self.sender.take()
    }

    /// Fill `left`/`right` with queued frames, zero-padding any shortfall.
    /// Returns the number of frames received.
    pub fn drain_into(&self, left: &mut [f32], right: &mut [f32]) -> usize {
        let n = left.len().min(right.len());
        let mut received = 0;
        while received < n {
            match self.rx.try_recv() {
                Ok((l, r)) => {
                    left[received] = l;
                    right[received] = r;
                    received += 1;
                }
                Err(_) => break,
            }
        }
        left[received..n].fill(0.0);
        right[received..n].fill(0.0);
        received
    }

    pub fn queued(&self) -> usize {
        self.rx.len()
    }

    pub fn dropped_samples(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn reset_dropped_samples(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Peak of the last block pushed by the device callback.
    pub fn peak_level(&self) -> f32 {
        self.peak.get()
    }
}

#[cfg(feature = "device")]
pub use device::{list_input_devices, AudioInputStream};

#[cfg(feature = "device")]
mod device {
    use super::InputSender;
    use crate::{Error, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::Sample;

    /// Holds a `cpal::Stream` in a `Send` context.
    struct StreamHandle(#[allow(dead_code)] cpal::Stream);

    // SAFETY: the stream is owned by `AudioInputStream`, never shared, and
    // dropped by whichever single owner holds it.
    unsafe impl Send for StreamHandle {}

    /// Running CPAL input stream feeding an [`InputSender`].
    pub struct AudioInputStream {
        sample_rate: f64,
        channels: usize,
        _stream: StreamHandle,
    }

    impl AudioInputStream {
        pub fn start(device_index: Option<usize>, sender: InputSender) -> Result<Self> {
            let host = cpal::default_host();
            let device = match device_index {
                Some(idx) => {
                    let devices: Vec<_> = host.input_devices()?.collect();
                    let count = devices.len();
                    devices.into_iter().nth(idx).ok_or_else(|| {
                        Error::AudioInput(format!(
                            "Input device index {} out of range (available: {})",
                            idx, count
                        ))
                    })?
                }
                None => host
                    .default_input_device()
                    .ok_or_else(|| Error::AudioInput("No input device available".to_string()))?,
            };
            let config = device.default_input_config()?;
            let sample_rate = config.sample_rate().0 as f64;
            let channels = config.channels() as usize;

            let stream = match config.sample_format() {
                cpal::SampleFormat::F32 => build::<f32>(&device, &config.into(), sender)?,
                cpal::SampleFormat::I16 => build::<i16>(&device, &config.into(), sender)?,
                cpal::SampleFormat::U16 => build::<u16>(&device, &config.into(), sender)?,
                format => {
                    return Err(Error::AudioInput(format!(
                        "Unsupported sample format: {:?}",
                        format
                    )));
                }
            };
            stream.play()?;
            tracing::info!(sample_rate, channels, "Audio input started");

            Ok(Self {
                sample_rate,
                channels,
                _stream: StreamHandle(stream),
            })
        }

        pub fn sample_rate(&self) -> f64 {
            self.sample_rate
        }

        pub fn channels(&self) -> usize {
            self.channels
        }
    }

    fn build<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        sender: InputSender,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample,
        f32: cpal::FromSample<T>,
    {
        let channels = config.channels as usize;
        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    for frame in data.chunks(channels.max(1)) {
                        let l = f32::from_sample(frame[0]);
                        let r = frame.get(1).map_or(l, |&s| f32::from_sample(s));
                        sender.push(l, r);
                    }
                }));
            },
            |_err| {
                // Stream error inside the device callback: nothing safe to do here.
            },
            None,
        )?;
        Ok(stream)
    }

    /// Names of available input devices, prefixed by index.
    pub fn list_input_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let mut names = Vec::new();
        for (idx, device) in host.input_devices()?.enumerate() {
            let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
            names.push(format!("{}: {}", idx, name));
        }
        Ok(names)
    }
}
