//! WAV import and export.

use crate::{Result, SampleBuffer};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Decode a WAV file into a planar buffer at its native rate.
///
/// Integer PCM is scaled to [-1, 1). Resampling to the engine rate happens at
/// playback time.
pub fn load_wav(path: impl AsRef<Path>) -> Result<SampleBuffer> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let buffer = SampleBuffer::from_interleaved(
        &interleaved,
        spec.channels as usize,
        spec.sample_rate as f64,
    )?;
    tracing::debug!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        frames = buffer.len(),
        "Loaded WAV"
    );
    Ok(buffer)
}

/// Write a buffer as 32-bit float WAV.
pub fn write_wav(path: impl AsRef<Path>, buffer: &SampleBuffer) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate().round() as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for i in 0..buffer.len() {
        for ch in 0..buffer.num_channels() {
            writer.write_sample(buffer.channel(ch)[i])?;
        }
    }
    writer.finalize()?;
    Ok(())
}
