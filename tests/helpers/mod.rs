//! Test helpers and fixtures for Stripline integration tests
//!
//! Every test drives [`EngineState::process`] by hand, one block at a time,
//! so results are sample-exact and need no audio device.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `DSP_EPSILON` (1e-4): DSP processing (interpolation, crossfades)
//! - `PERCEPTUAL_EPSILON` (0.001): Perceptual equivalence (-60dB)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use stripline::prelude::*;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard buffer size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// Route `tracing` output to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Engine at the test sample rate with default strips and columns.
pub fn test_engine() -> Engine {
    init_tracing();
    Engine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .max_block_size(TEST_BUFFER_SIZE)
        .build()
        .expect("Failed to create test engine")
}

/// Engine plus its audio-side processor.
pub fn test_engine_with_state() -> (Engine, EngineState) {
    let engine = test_engine();
    let state = engine.take_processor().expect("Processor already taken");
    (engine, state)
}

/// Render `frames` of output with no input.
pub fn render(state: &mut EngineState, host: &HostTransport, frames: usize) -> (Vec<f32>, Vec<f32>) {
    render_with_input(state, host, &[], frames)
}

/// Render `frames` of output, feeding `input` to both input channels.
pub fn render_with_input(
    state: &mut EngineState,
    host: &HostTransport,
    input: &[f32],
    frames: usize,
) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    state.process(host, &[input, input], &mut [&mut left[..], &mut right[..]]);
    (left, right)
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 4.0 - 1.0
        })
        .collect()
}

/// Generate a normalized staircase signal in range [0, 1).
///
/// Each sample is proportional to its index, so a read position can be
/// recovered from the output value.
pub fn generate_staircase(num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| i as f32 / num_samples as f32)
        .collect()
}

/// Stereo buffer from two channels at the test sample rate.
pub fn stereo_buffer(left: Vec<f32>, right: Vec<f32>) -> SampleBuffer {
    SampleBuffer::new(vec![left, right], TEST_SAMPLE_RATE).expect("Invalid test buffer")
}

/// Mono buffer at the test sample rate.
pub fn mono_buffer(data: Vec<f32>) -> SampleBuffer {
    SampleBuffer::new(vec![data], TEST_SAMPLE_RATE).expect("Invalid test buffer")
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Check if two signals are approximately equal within tolerance.
pub fn signals_approx_equal(a: &[f32], b: &[f32], tolerance: f32) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tolerance)
}

/// Assert signal is silent within threshold.
pub fn assert_is_silent(samples: &[f32], threshold: f32, context: &str) {
    let max_val = peak(samples);
    assert!(
        max_val <= threshold,
        "{}: Expected silence (threshold {}), but peak was {}",
        context,
        threshold,
        max_val
    );
}

/// Assert signal is NOT silent (has content above threshold).
pub fn assert_not_silent(samples: &[f32], min_peak: f32, context: &str) {
    let max_val = peak(samples);
    assert!(
        max_val >= min_peak,
        "{}: Expected audio (min_peak {}), but peak was only {}",
        context,
        min_peak,
        max_val
    );
}

/// Write a 16-bit stereo WAV for load tests.
pub fn write_test_wav(path: &std::path::Path, left: &[f32], right: &[f32], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV");
    for (&l, &r) in left.iter().zip(right) {
        writer
            .write_sample((l * 32767.0) as i16)
            .expect("Failed to write sample");
        writer
            .write_sample((r * 32767.0) as i16)
            .expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}
