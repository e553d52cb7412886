//! Hardware I/O: drives an [`EngineState`] from a CPAL output stream, with
//! live input bridged in from a CPAL input stream.

use crate::{Engine, Error, Result};
use stripline_core::{AudioOutput, HostTransport, OutputConfig};
use stripline_sampler::audio_input::{AudioInput, AudioInputStream};

/// Frames of input buffered between the two device callbacks.
const INPUT_QUEUE_FRAMES: usize = 16_384;

#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
    pub output_device: Option<usize>,
    pub input_device: Option<usize>,
    /// Open an input stream feeding the recorder and monitor.
    pub enable_input: bool,
}

/// Running device streams. Dropping it stops audio.
pub struct DeviceRunner {
    output: AudioOutput,
    _input: Option<AudioInputStream>,
}

impl DeviceRunner {
    pub fn sample_rate(&self) -> f64 {
        self.output.sample_rate()
    }

    pub fn is_running(&self) -> bool {
        self.output.is_running()
    }

    pub fn stop(&mut self) {
        self.output.stop();
    }
}

/// Start audio for `engine` in free-running mode.
///
/// The engine must have been built at the output device's sample rate.
pub fn run(engine: &Engine, config: DeviceConfig) -> Result<DeviceRunner> {
    let mut output = AudioOutput::new(OutputConfig {
        output_device_index: config.output_device,
        max_block_size: engine.config().max_block_size,
    })?;
    if (output.sample_rate() - engine.sample_rate()).abs() > f64::EPSILON {
        return Err(stripline_core::Error::InvalidConfig(format!(
            "Engine sample rate {} does not match output device rate {}",
            engine.sample_rate(),
            output.sample_rate()
        ))
        .into());
    }

    let mut state = engine.take_processor().ok_or(Error::ProcessorTaken)?;

    let mut input = AudioInput::new(INPUT_QUEUE_FRAMES);
    let input_stream = match (config.enable_input, input.take_sender()) {
        (true, Some(sender)) => {
            let stream = AudioInputStream::start(config.input_device, sender)?;
            if (stream.sample_rate() - engine.sample_rate()).abs() > f64::EPSILON {
                tracing::warn!(
                    input_rate = stream.sample_rate(),
                    engine_rate = engine.sample_rate(),
                    "Input device rate differs from engine rate"
                );
            }
            Some(stream)
        }
        _ => None,
    };

    let block = engine.config().max_block_size;
    let mut in_l = vec![0.0f32; block];
    let mut in_r = vec![0.0f32; block];
    let transport = HostTransport::free_running();

    output.start(move |left, right| {
        let n = left.len().min(right.len()).min(block);
        input.drain_into(&mut in_l[..n], &mut in_r[..n]);
        state.process(
            &transport,
            &[&in_l[..n], &in_r[..n]],
            &mut [&mut left[..n], &mut right[..n]],
        );
    })?;
    tracing::info!(
        sample_rate = output.sample_rate(),
        input = input_stream.is_some(),
        "Device audio running"
    );

    Ok(DeviceRunner {
        output,
        _input: input_stream,
    })
}
