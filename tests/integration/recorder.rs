//! Continuous recorder integration tests
//!
//! Loop lengths follow the clock tempo, captures read the newest history,
//! and the baked pre-roll makes the loop end flow into the loop start.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use stripline::prelude::*;
use stripline::sampler::{loop_length_samples, ContinuousRecorder};

fn one_beat_bar_engine() -> (Engine, EngineState) {
    let engine = Engine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .max_block_size(TEST_BUFFER_SIZE)
        .beats_per_bar(1)
        .tempo(120.0)
        .build()
        .unwrap();
    let state = engine.take_processor().unwrap();
    (engine, state)
}

fn feed(state: &mut EngineState, signal: &[f32]) {
    for chunk in signal.chunks(TEST_BUFFER_SIZE) {
        render_with_input(state, &HostTransport::free_running(), chunk, chunk.len());
    }
}

#[test]
fn test_loop_length_follows_tempo() {
    assert_eq!(loop_length_samples(120.0, 1, 4, 48000.0), 96_000);
    assert_eq!(loop_length_samples(120.0, 1, 1, 48000.0), 24_000);
    assert_eq!(loop_length_samples(60.0, 2, 4, 44100.0), 352_800);
    assert_eq!(loop_length_samples(0.0, 1, 4, 48000.0), 0);
    assert_eq!(loop_length_samples(f64::NAN, 1, 4, 48000.0), 0);
}

#[test]
fn test_capture_report_regions_are_disjoint() {
    let mut recorder = ContinuousRecorder::new(2, 8192, TEST_SAMPLE_RATE);
    let signal = generate_sine(220.0, TEST_SAMPLE_RATE, 6000);
    recorder.write(&[&signal[..], &signal[..]]);

    let (buffer, report) = recorder.capture(4000, 480).unwrap();
    assert_eq!(buffer.len(), 4000);
    assert_eq!(report.crossfade, 480);
    assert_eq!(report.loop_region, 2000..6000);
    assert_eq!(report.pre_roll, 1520..2000);
    assert_eq!(report.pre_roll.end, report.loop_region.start);
}

#[test]
fn test_captured_tail_lands_on_pre_roll() {
    let mut recorder = ContinuousRecorder::new(2, 16_384, TEST_SAMPLE_RATE);
    let left = generate_noise(10_000, 5);
    let right = generate_noise(10_000, 9);
    recorder.write(&[&left[..], &right[..]]);

    let (len, c) = (4800, 480);
    let (raw, _) = recorder.capture(len + c, 0).unwrap();
    let (baked, _) = recorder.capture(len, c).unwrap();

    for ch in 0..2 {
        let raw = raw.channel(ch);
        let baked = baked.channel(ch);
        // raw[..c] is the pre-roll, raw[c..] the loop itself.
        assert_eq!(&baked[..len - c], &raw[c..len]);
        assert_eq!(baked[len - 1], raw[c - 1]);
        assert_eq!(baked[len - c], raw[len]);
    }
}

#[test]
fn test_capture_waits_for_enough_history() {
    let mut recorder = ContinuousRecorder::new(1, 16_384, TEST_SAMPLE_RATE);
    recorder.write(&[&vec![0.1; 4000][..]]);
    assert!(recorder.capture(4000, 480).is_err());
    assert!(recorder.capture(3520, 480).is_ok());
}

#[test]
fn test_engine_capture_installs_and_triggers() {
    let (engine, mut state) = one_beat_bar_engine();
    let signal = generate_sine(440.0, TEST_SAMPLE_RATE, 30 * TEST_BUFFER_SIZE * 2);
    feed(&mut state, &signal);

    assert_eq!(engine.request_capture(2, 1).unwrap(), CaptureStatus::Pending);
    assert_eq!(engine.capture_status(), CaptureStatus::Pending);
    render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);

    assert_eq!(engine.capture_status(), CaptureStatus::Captured);
    let strip = engine.strip(2).unwrap();
    assert!(strip.has_sample());
    assert_eq!(strip.buffer().len(), 24_000);
    assert_eq!(strip.buffer().num_channels(), 2);

    // Installed with auto-trigger: sounds from the next block.
    let (left, _) = render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    assert!(strip.is_playing());
    assert_not_silent(&left, 0.1, "captured loop");
}

#[test]
fn test_capture_uses_strip_recording_bars() {
    let (engine, mut state) = one_beat_bar_engine();
    let signal = generate_sine(440.0, TEST_SAMPLE_RATE, 60 * TEST_BUFFER_SIZE * 2);
    feed(&mut state, &signal);

    engine.set_recording_bars(3, 2).unwrap();
    assert_eq!(engine.strip(3).unwrap().recording_bars(), 2);
    assert_eq!(
        engine.request_capture_default(3).unwrap(),
        CaptureStatus::Pending
    );
    render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);

    assert_eq!(engine.capture_status(), CaptureStatus::Captured);
    // Two one-beat bars at 120 BPM.
    assert_eq!(engine.strip(3).unwrap().buffer().len(), 48_000);

    engine.set_recording_bars(0, 20).unwrap();
    assert_eq!(engine.strip(0).unwrap().recording_bars(), 8);
    assert!(engine.request_capture_default(99).is_err());
}

#[test]
fn test_capture_without_history_reports_status() {
    let (engine, mut state) = one_beat_bar_engine();
    feed(&mut state, &generate_sine(440.0, TEST_SAMPLE_RATE, 4096));

    assert_eq!(engine.request_capture(0, 1).unwrap(), CaptureStatus::Pending);
    render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    assert_eq!(engine.capture_status(), CaptureStatus::InsufficientHistory);
    assert!(!engine.strip(0).unwrap().has_sample());
}

#[test]
fn test_capture_bars_are_clamped() {
    let (engine, _state) = one_beat_bar_engine();
    // 0 bars behaves as 1; 99 bars clamps to the configured maximum, which
    // still fits the recorder.
    assert_eq!(engine.request_capture(0, 0).unwrap(), CaptureStatus::Pending);
    assert_eq!(engine.request_capture(1, 99).unwrap(), CaptureStatus::Pending);
    assert!(engine.request_capture(99, 1).is_err());
}

#[test]
fn test_capture_too_long_for_recorder() {
    let (engine, mut state) = test_engine_with_state();
    // 4 bars at 20 BPM is longer than a recorder sized for 40 BPM.
    engine.set_tempo(20.0);
    render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    assert_eq!(
        engine.request_capture(0, 4).unwrap(),
        CaptureStatus::InsufficientHistory
    );
}

#[test]
fn test_recording_progress_and_clear() {
    let (engine, mut state) = one_beat_bar_engine();
    assert_eq!(engine.recording_progress(), 0.0);

    feed(&mut state, &vec![0.2; 10 * TEST_BUFFER_SIZE]);
    let progress = engine.recording_progress();
    assert!(progress > 0.0 && progress < 1.0);
    assert_eq!(engine.recorder().history_len(), 10 * TEST_BUFFER_SIZE);

    engine.clear_recorder();
    render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    assert_eq!(engine.recorder().history_len(), TEST_BUFFER_SIZE);
}

#[test]
fn test_recorder_removes_dc_offset() {
    let mut recorder = ContinuousRecorder::new(1, 96_000, TEST_SAMPLE_RATE);
    recorder.write(&[&vec![0.5; 48_000][..]]);
    let (buffer, _) = recorder.capture(1000, 0).unwrap();
    assert!(peak(buffer.channel(0)) < SILENCE_THRESHOLD * 100.0);
}

#[test]
fn test_crossfade_ms_is_clamped() {
    let engine = test_engine();
    assert_eq!(engine.set_crossfade_ms(0.0), 1.0);
    assert_eq!(engine.set_crossfade_ms(500.0), 50.0);
    assert_eq!(engine.set_crossfade_ms(10.0), 10.0);
    assert_eq!(engine.recorder().crossfade_samples(), 480);
    assert!((engine.recorder().crossfade_ms() - 10.0).abs() < FLOAT_EPSILON);
}
