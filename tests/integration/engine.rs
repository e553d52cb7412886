//! Engine lifecycle integration tests
//!
//! Construction, sample loading, mixing and status reporting, all driven
//! through the control API and a hand-pumped processor.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_abs_diff_eq;
use stripline::prelude::*;
use stripline::{EngineConfig, Error, StripStatus};

fn constant_strip(engine: &Engine, strip: usize, value: f32) {
    engine
        .load_buffer(strip, mono_buffer(vec![value; 48_000]))
        .unwrap();
    engine.set_trigger_fade_ms(strip, 0.0).unwrap();
}

/// Render enough blocks for fades and gain smoothing to settle, then one more.
fn settled(state: &mut EngineState) -> (Vec<f32>, Vec<f32>) {
    for _ in 0..8 {
        render(state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    }
    render(state, &HostTransport::free_running(), TEST_BUFFER_SIZE)
}

#[test]
fn test_engine_reports_config() {
    let engine = Engine::builder()
        .sample_rate(44100.0)
        .strips(8)
        .columns(8)
        .build()
        .unwrap();
    assert_eq!(engine.sample_rate(), 44100.0);
    assert_eq!(engine.num_strips(), 8);
    assert_eq!(engine.num_columns(), 8);
    assert_eq!(engine.leds().len(), 8);
    assert!(engine.led_rows().iter().all(|row| row.len() == 8));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = EngineConfig {
        sample_rate: 10.0,
        ..EngineConfig::default()
    };
    assert!(matches!(Engine::new(config), Err(Error::Core(_))));
    assert!(Engine::builder().strips(0).build().is_err());
}

#[test]
fn test_processor_can_be_taken_once() {
    let engine = test_engine();
    let state = engine.take_processor();
    assert!(state.is_some());
    assert!(engine.take_processor().is_none());
    assert_eq!(state.map(|s| s.num_strips()), Some(engine.num_strips()));
}

#[test]
fn test_load_sample_from_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loop.wav");
    let left = generate_sine(220.0, TEST_SAMPLE_RATE, 4800);
    let right: Vec<f32> = left.iter().map(|s| s * 0.5).collect();
    write_test_wav(&path, &left, &right, 48000);

    let engine = test_engine();
    engine.load_sample(1, &path).unwrap();

    let buffer = engine.strip(1).unwrap().buffer();
    assert_eq!(buffer.len(), 4800);
    assert_eq!(buffer.num_channels(), 2);
    assert_eq!(buffer.sample_rate(), 48000.0);
    assert!(signals_approx_equal(buffer.channel(0), &left, 2.0 * INT16_EPSILON));
    assert!(signals_approx_equal(buffer.channel(1), &right, 2.0 * INT16_EPSILON));
}

#[test]
fn test_load_missing_file_fails() {
    let engine = test_engine();
    let err = engine.load_sample(0, "/nonexistent/loop.wav").unwrap_err();
    assert!(matches!(err, Error::Sampler(_)));
    assert!(!engine.strip(0).unwrap().has_sample());
}

#[test]
fn test_load_resets_inner_loop() {
    let engine = test_engine();
    constant_strip(&engine, 0, 0.5);
    engine.define_inner_loop(0, 9, 2).unwrap();
    constant_strip(&engine, 0, 0.25);

    let leds = engine.leds()[0];
    assert_eq!(leds.inner_loop, None);
    assert!(!leds.reversed);
}

#[test]
fn test_strips_sum_into_mix() {
    let (engine, mut state) = test_engine_with_state();
    constant_strip(&engine, 0, 0.25);
    constant_strip(&engine, 1, 0.125);
    engine.trigger(0, 0, false).unwrap();
    engine.trigger(1, 0, false).unwrap();

    let (left, right) = settled(&mut state);
    assert!(signals_approx_equal(&left, &vec![0.375; TEST_BUFFER_SIZE], DSP_EPSILON));
    assert!(signals_approx_equal(&right, &left, FLOAT_EPSILON));
}

#[test]
fn test_pan_is_balance() {
    let (engine, mut state) = test_engine_with_state();
    constant_strip(&engine, 0, 0.5);
    engine.set_pan(0, 1.0).unwrap();
    engine.trigger(0, 0, false).unwrap();

    let (left, right) = settled(&mut state);
    assert_is_silent(&left, SILENCE_THRESHOLD, "panned hard right");
    assert!((peak(&right) - 0.5).abs() < DSP_EPSILON);

    engine.set_pan(0, 0.0).unwrap();
    let (left, right) = settled(&mut state);
    assert!((peak(&left) - 0.5).abs() < DSP_EPSILON);
    assert!((peak(&right) - 0.5).abs() < DSP_EPSILON);
}

#[test]
fn test_volume_scales_strip() {
    let (engine, mut state) = test_engine_with_state();
    constant_strip(&engine, 0, 0.5);
    engine.set_volume(0, 0.5).unwrap();
    engine.trigger(0, 0, false).unwrap();

    let (left, _) = settled(&mut state);
    assert!((rms(&left) - 0.25).abs() < DSP_EPSILON);
}

#[test]
fn test_group_mute_and_volume() {
    let (engine, mut state) = test_engine_with_state();
    constant_strip(&engine, 0, 0.5);
    constant_strip(&engine, 1, 0.25);
    engine.assign_group(0, Some(1)).unwrap();
    engine.trigger(0, 0, false).unwrap();
    engine.trigger(1, 0, false).unwrap();

    engine.set_group_volume(1, 0.5).unwrap();
    let (left, _) = settled(&mut state);
    assert!((peak(&left) - 0.5).abs() < DSP_EPSILON);

    engine.set_group_muted(1, true).unwrap();
    let (left, _) = settled(&mut state);
    assert!((peak(&left) - 0.25).abs() < DSP_EPSILON);
    // Muting silences the output but the strip keeps its place.
    assert!(engine.strip(0).unwrap().is_playing());
}

#[test]
fn test_group_trigger_is_exclusive() {
    let (engine, mut state) = test_engine_with_state();
    constant_strip(&engine, 0, 0.5);
    constant_strip(&engine, 1, 0.25);
    engine.assign_group(0, Some(0)).unwrap();
    engine.assign_group(1, Some(0)).unwrap();

    engine.trigger(0, 0, false).unwrap();
    settled(&mut state);
    engine.trigger(1, 0, false).unwrap();
    settled(&mut state);

    assert!(!engine.strip(0).unwrap().is_playing());
    assert!(engine.strip(1).unwrap().is_playing());
}

#[test]
fn test_master_gain_and_meters() {
    let (engine, mut state) = test_engine_with_state();
    constant_strip(&engine, 0, 0.5);
    engine.set_master_gain(0.5);
    engine.trigger(0, 0, false).unwrap();

    let (left, _) = settled(&mut state);
    assert!((peak(&left) - 0.25).abs() < DSP_EPSILON);
    let (out_l, out_r) = engine.output_levels();
    assert_abs_diff_eq!(out_l, 0.25, epsilon = PERCEPTUAL_EPSILON);
    assert_abs_diff_eq!(out_r, 0.25, epsilon = PERCEPTUAL_EPSILON);

    engine.set_master_gain(5.0);
    assert_eq!(engine.master_gain(), 2.0);
}

#[test]
fn test_input_monitoring() {
    let (engine, mut state) = test_engine_with_state();
    let input = vec![0.3; TEST_BUFFER_SIZE];

    engine.set_input_monitor_gain(0.0);
    let (left, _) = render_with_input(
        &mut state,
        &HostTransport::free_running(),
        &input,
        TEST_BUFFER_SIZE,
    );
    assert_is_silent(&left, SILENCE_THRESHOLD, "monitor off");
    assert!((engine.input_levels().0 - 0.3).abs() < PERCEPTUAL_EPSILON);

    engine.set_input_monitor_gain(1.0);
    for _ in 0..8 {
        render_with_input(
            &mut state,
            &HostTransport::free_running(),
            &input,
            TEST_BUFFER_SIZE,
        );
    }
    let (left, right) = render_with_input(
        &mut state,
        &HostTransport::free_running(),
        &input,
        TEST_BUFFER_SIZE,
    );
    assert!(signals_approx_equal(&left, &input, DSP_EPSILON));
    assert!(signals_approx_equal(&right, &input, DSP_EPSILON));
}

#[test]
fn test_stop_all_fades_out() {
    let (engine, mut state) = test_engine_with_state();
    constant_strip(&engine, 0, 0.5);
    constant_strip(&engine, 2, 0.5);
    engine.trigger(0, 0, false).unwrap();
    engine.trigger(2, 3, false).unwrap();
    settled(&mut state);

    engine.stop_all(false);
    let (left, _) = settled(&mut state);
    assert_is_silent(&left, 0.0, "after stop_all");
    assert!(engine.leds().iter().all(|leds| !leds.playing));
}

#[test]
fn test_invalid_indices_are_errors() {
    let engine = test_engine();
    assert!(matches!(
        engine.trigger(99, 0, false),
        Err(Error::Sampler(stripline::sampler::Error::InvalidStrip { index: 99, .. }))
    ));
    assert!(engine.set_volume(6, 1.0).is_err());
    assert!(engine.request_capture(6, 1).is_err());
    assert!(matches!(
        engine.set_group_volume(4, 1.0),
        Err(Error::Sampler(stripline::sampler::Error::InvalidGroup { index: 4, .. }))
    ));
    assert!(engine.assign_group(0, Some(4)).is_err());
}

#[test]
fn test_poll_status_reports_missing_sample() {
    let engine = test_engine();
    assert_eq!(engine.trigger(3, 0, false).unwrap(), false);
    assert_eq!(engine.status(3).unwrap(), StripStatus::NoSample);

    let statuses = engine.poll_status();
    assert_eq!(statuses, vec![(3, StripStatus::NoSample)]);
    assert!(engine.poll_status().is_empty());
}

#[test]
fn test_clear_sample_stops_strip() {
    let (engine, mut state) = test_engine_with_state();
    constant_strip(&engine, 0, 0.5);
    engine.trigger(0, 0, false).unwrap();
    settled(&mut state);

    engine.clear_sample(0).unwrap();
    let (left, _) = settled(&mut state);
    assert_is_silent(&left, 0.0, "cleared strip");
    assert!(!engine.strip(0).unwrap().is_playing());
    assert!(!engine.strip(0).unwrap().has_sample());
}
