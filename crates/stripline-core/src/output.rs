//! CPAL audio output wrapper.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub output_device_index: Option<usize>,
    /// Largest block handed to the render callback; device buffers are split to fit.
    pub max_block_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_device_index: None,
            max_block_size: 1024,
        }
    }
}

/// Holds a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` on some platforms. The handle is only created
/// and dropped by the owning `AudioOutput`, which is never shared.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: the stream is never accessed after construction; it is only
// dropped, from whichever thread owns the AudioOutput.
unsafe impl Send for StreamHandle {}

/// Stereo output stream driven by a planar render callback.
pub struct AudioOutput {
    sample_rate: f64,
    channels: usize,
    config: OutputConfig,
    stream: Option<StreamHandle>,
}

impl AudioOutput {
    pub fn new(config: OutputConfig) -> Result<Self> {
        let device = Self::get_device(config.output_device_index)?;
        let output_config = device.default_output_config()?;
        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = output_config.sample_rate().0,
            channels = output_config.channels(),
            "Opened output device"
        );

        Ok(Self {
            sample_rate: output_config.sample_rate().0 as f64,
            channels: output_config.channels() as usize,
            config,
            stream: None,
        })
    }

    /// Start the stream. `render` fills `(left, right)` for each block.
    pub fn start<F>(&mut self, render: F) -> Result<()>
    where
        F: FnMut(&mut [f32], &mut [f32]) + Send + 'static,
    {
        if self.stream.is_some() {
            return Ok(());
        }

        let device = Self::get_device(self.config.output_device_index)?;
        let config = device.default_output_config()?;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream::<f32, F>(&device, &config.into(), render)?,
            cpal::SampleFormat::I16 => self.build_stream::<i16, F>(&device, &config.into(), render)?,
            cpal::SampleFormat::U16 => self.build_stream::<u16, F>(&device, &config.into(), render)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {:?}",
                    format
                )));
            }
        };

        stream.play()?;
        self.stream = Some(StreamHandle(stream));
        tracing::debug!("Output stream started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Output stream stopped");
        }
    }

    fn get_device(index: Option<usize>) -> Result<cpal::Device> {
        let host = cpal::default_host();

        if let Some(idx) = index {
            let devices: Vec<_> = host.output_devices()?.collect();
            let device_count = devices.len();
            devices.into_iter().nth(idx).ok_or_else(|| {
                Error::InvalidDevice(format!(
                    "Output device index {} out of range (available: {})",
                    idx, device_count
                ))
            })
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::InvalidDevice("No output device available".to_string()))
        }
    }

    fn build_stream<T, F>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut render: F,
    ) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
        F: FnMut(&mut [f32], &mut [f32]) + Send + 'static,
    {
        let channels = config.channels as usize;
        let max_block = self.config.max_block_size.max(1);
        let mut left = vec![0.0f32; max_block];
        let mut right = vec![0.0f32; max_block];

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    for chunk in data.chunks_mut(max_block * channels) {
                        let frames = chunk.len() / channels;
                        let (l, r) = (&mut left[..frames], &mut right[..frames]);
                        l.fill(0.0);
                        r.fill(0.0);
                        render(l, r);

                        for (frame, out) in chunk.chunks_mut(channels).enumerate() {
                            for (ch, sample) in out.iter_mut().enumerate() {
                                let value = match ch {
                                    0 => l[frame],
                                    1 => r[frame],
                                    _ => 0.0,
                                };
                                *sample = T::from_sample(value);
                            }
                        }
                    }
                }));

                if result.is_err() {
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0);
                    }
                }
            },
            |_err| {
                // Cannot log from the device thread
            },
            None,
        )?;

        Ok(stream)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        host.output_devices()?
            .enumerate()
            .map(|(idx, device)| Ok(format!("{}: {}", idx, device.name()?)))
            .collect()
    }
}
