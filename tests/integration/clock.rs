//! Musical clock integration tests
//!
//! Host-synced blocks copy the host position; a stopped host freezes it.
//! Quantized triggers must land on the same sample however often the host
//! was stopped and restarted before the boundary.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use stripline::prelude::*;
use stripline::ClockMode;

const SAMPLES_PER_BEAT_120: f64 = 24_000.0;

fn host(playing: bool, beat: f64) -> HostTransport {
    HostTransport::host(playing, beat, Some(120.0))
}

#[test]
fn test_host_position_is_copied_verbatim() {
    let (engine, mut state) = test_engine_with_state();

    render(&mut state, &host(true, 7.25), 256);
    let snapshot = engine.clock();
    assert_eq!(snapshot.beat, 7.25);
    assert_eq!(snapshot.mode, ClockMode::HostSynced);
    assert!(snapshot.running);

    // Host loops back: no smoothing, no accumulation.
    render(&mut state, &host(true, 3.0), 256);
    assert_eq!(engine.clock().beat, 3.0);
}

#[test]
fn test_stopped_host_freezes_position() {
    let (engine, mut state) = test_engine_with_state();
    render(&mut state, &host(true, 4.0), 256);

    for _ in 0..10 {
        render(&mut state, &host(false, 9.0), 256);
        let snapshot = engine.clock();
        assert_eq!(snapshot.beat, 4.0);
        assert!(!snapshot.running);
    }
    assert_eq!(state.clock().beat_at_offset(200), 4.0);
}

#[test]
fn test_free_running_advances_by_tempo() {
    let (engine, mut state) = test_engine_with_state();
    assert_eq!(engine.set_tempo(120.0), 120.0);

    for _ in 0..100 {
        render(&mut state, &HostTransport::free_running(), 480);
    }
    // 48000 samples at 120 BPM is two beats.
    assert!((state.clock().beat_at_offset(480) - 2.0).abs() < 1e-9);
    assert_eq!(engine.clock().mode, ClockMode::FreeRunning);
    assert_eq!(engine.clock().global_sample, 48_000);
}

#[test]
fn test_host_tempo_overrides_internal_tempo() {
    let (engine, mut state) = test_engine_with_state();
    engine.set_tempo(90.0);

    render(&mut state, &HostTransport::host(true, 0.0, Some(140.0)), 128);
    assert_eq!(engine.clock().tempo, 140.0);

    render(&mut state, &HostTransport::free_running(), 128);
    assert_eq!(engine.clock().tempo, 90.0);

    assert_eq!(engine.set_tempo(5000.0), 999.0);
}

#[test]
fn test_quantized_trigger_is_sample_accurate() {
    let (engine, mut state) = test_engine_with_state();
    engine
        .load_buffer(0, mono_buffer(vec![0.5; 96_000]))
        .unwrap();
    engine.set_quantization(QuantizeDivision::new(4));
    engine.trigger(0, 0, true).unwrap();

    // Beat 1.0 is 0.01 beats (240 samples) into this block.
    let (left, _) = render(&mut state, &host(true, 0.99), 512);
    assert_is_silent(&left[..240], 0.0, "before boundary");
    assert_not_silent(&left[240..], 0.1, "after boundary");
    assert!(engine.strip(0).unwrap().is_playing());
}

#[test]
fn test_quantized_trigger_waits_across_blocks() {
    let (engine, mut state) = test_engine_with_state();
    engine
        .load_buffer(0, mono_buffer(vec![0.5; 96_000]))
        .unwrap();
    engine.set_quantization(QuantizeDivision::new(1));
    engine.trigger(0, 0, true).unwrap();

    // Whole-note grid: the trigger waits for beat 4.
    let mut beat = 1.5;
    let step = TEST_BUFFER_SIZE as f64 / SAMPLES_PER_BEAT_120;
    while beat + step <= 4.0 {
        let (left, _) = render(&mut state, &host(true, beat), TEST_BUFFER_SIZE);
        assert_is_silent(&left, SILENCE_THRESHOLD, "waiting for bar");
        assert!(engine.leds()[0].awaiting_trigger);
        beat += step;
    }
    render(&mut state, &host(true, beat), TEST_BUFFER_SIZE);
    assert!(engine.strip(0).unwrap().is_playing());
}

/// Run a quantized trigger to its boundary after `cycles` stop/start cycles
/// at a fixed host position, returning the playhead after every block.
fn trigger_trace(cycles: usize) -> Vec<f64> {
    let (engine, mut state) = test_engine_with_state();
    engine
        .load_buffer(0, mono_buffer(generate_staircase(96_000)))
        .unwrap();
    engine.set_quantization(QuantizeDivision::new(4));
    engine.trigger(0, 0, true).unwrap();

    for _ in 0..cycles {
        render(&mut state, &host(false, 0.1), 128);
        render(&mut state, &host(true, 0.1), 128);
    }

    let mut beat = 0.1;
    let mut trace = Vec::new();
    for _ in 0..60 {
        render(&mut state, &host(true, beat), TEST_BUFFER_SIZE);
        trace.push(engine.strip(0).unwrap().position());
        beat += TEST_BUFFER_SIZE as f64 / SAMPLES_PER_BEAT_120;
    }
    trace
}

#[test]
fn test_stop_start_cycles_do_not_drift() {
    let reference = trigger_trace(0);
    assert!(reference.iter().any(|&pos| pos > 0.0), "trigger never fired");

    let cycled = trigger_trace(1000);
    assert_eq!(cycled, reference);
}

#[test]
fn test_record_led_blinks_on_beat() {
    let (engine, mut state) = test_engine_with_state();
    render(&mut state, &host(true, 2.25), 64);
    assert!(engine.record_led());
    render(&mut state, &host(true, 2.75), 64);
    assert!(!engine.record_led());
}

#[test]
fn test_reset_rewinds_free_running_clock() {
    let (engine, mut state) = test_engine_with_state();
    for _ in 0..10 {
        render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    }
    assert!(engine.clock().beat > 0.0);
    engine.reset_clock();
    render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    assert!((engine.clock().beat - 0.0).abs() < FLOAT_EPSILON as f64);
}
