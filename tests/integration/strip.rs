//! Strip integration tests
//!
//! Inner loops, seam baking and play modes, driven through the engine.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use proptest::prelude::*;
use stripline::dsp::{equal_power, raised_cosine};
use stripline::prelude::*;
use stripline::{CrossfadeCurve, Resampler};

/// Four seconds of uncorrelated stereo noise at the test rate.
fn four_second_noise() -> SampleBuffer {
    let len = 4 * TEST_SAMPLE_RATE as usize;
    stereo_buffer(generate_noise(len, 7), generate_noise(len, 11))
}

fn max_step(samples: &[f32]) -> f32 {
    samples
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0, f32::max)
}

#[test]
fn test_inner_loop_direction_from_press_order() {
    let engine = test_engine();
    engine.load_buffer(0, four_second_noise()).unwrap();

    assert_eq!(engine.define_inner_loop(0, 7, 3).unwrap(), (3, 7));
    let backward = engine.leds()[0];
    assert_eq!(backward.inner_loop, Some((3, 7)));
    assert!(backward.reversed);

    assert_eq!(engine.define_inner_loop(0, 3, 7).unwrap(), (3, 7));
    let forward = engine.leds()[0];
    assert_eq!(forward.inner_loop, Some((3, 7)));
    assert!(!forward.reversed);

    engine.clear_inner_loop(0).unwrap();
    assert_eq!(engine.leds()[0].inner_loop, None);
    assert!(!engine.leds()[0].reversed);
}

#[test]
fn test_single_column_loop() {
    let engine = test_engine();
    engine.load_buffer(0, four_second_noise()).unwrap();
    assert_eq!(engine.define_inner_loop(0, 5, 5).unwrap(), (5, 6));
}

#[test]
fn test_reverse_inner_loop_plays_backward() {
    let (engine, mut state) = test_engine_with_state();
    engine
        .load_buffer(0, mono_buffer(generate_staircase(16_000)))
        .unwrap();
    engine.define_inner_loop(0, 7, 3).unwrap();
    engine.trigger(0, 7, false).unwrap();

    // Column 7 starts at the loop end, so playback enters at end - 1.
    render(&mut state, &HostTransport::free_running(), 256);
    assert_eq!(engine.strip(0).unwrap().position(), 6999.0 - 256.0);

    for _ in 0..40 {
        render(&mut state, &HostTransport::free_running(), 256);
        let pos = engine.strip(0).unwrap().position();
        assert!((3000.0..7000.0).contains(&pos), "position {pos} left the loop");
    }
}

/// 4 s stereo sample, loop [2, 6) of 16 columns, 10 ms crossfade at 48 kHz.
#[test]
fn test_bake_uses_pre_roll_not_loop_start() {
    let engine = test_engine();
    let original = four_second_noise();
    engine.load_buffer(0, original.clone()).unwrap();
    engine.set_loop_crossfade_ms(0, 10.0).unwrap();
    engine.define_inner_loop(0, 2, 6).unwrap();

    assert_eq!(engine.bake_inner_loop(0).unwrap(), 480);
    let baked = engine.strip(0).unwrap().buffer();

    let (start, end) = (24_000, 72_000);
    for ch in 0..2 {
        let before = &original.channel(ch)[end - 480..end];
        let after = &baked.channel(ch)[end - 480..end];
        let loop_head = &original.channel(ch)[start..start + 480];

        let changed = before.iter().zip(after).filter(|(a, b)| a != b).count();
        assert!(changed >= 479, "channel {ch}: only {changed} samples changed");
        assert!(!signals_approx_equal(after, loop_head, PERCEPTUAL_EPSILON));

        // Last baked sample is the sample right before the loop start.
        assert_eq!(after[479], original.channel(ch)[start - 1]);
        // Nothing outside the tail is touched.
        assert_eq!(
            &baked.channel(ch)[..end - 480],
            &original.channel(ch)[..end - 480]
        );
    }
}

#[test]
fn test_runtime_seam_is_continuous() {
    let (engine, mut state) = test_engine_with_state();
    let sine = generate_sine(100.0, TEST_SAMPLE_RATE, 16_000);
    engine.load_buffer(0, mono_buffer(sine)).unwrap();
    engine.define_inner_loop(0, 2, 6).unwrap();
    engine.trigger(0, 2, false).unwrap();

    let mut out = Vec::new();
    for _ in 0..20 {
        let (left, _) = render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
        out.extend(left);
    }
    // 4000-sample loop played ~2.5 times; a hard seam would jump by up to 2.
    assert!(max_step(&out) < 0.05, "max step {}", max_step(&out));
}

/// 30 whole periods of a 100 Hz sine, so the sample end flows into its start.
/// Three columns hold 5.625 periods: an unblended wrap jumps by about 0.7.
fn periodic_sine() -> SampleBuffer {
    mono_buffer(generate_sine(100.0, TEST_SAMPLE_RATE, 14_400))
}

#[test]
fn test_seam_at_first_column_wraps_pre_roll() {
    let (engine, mut state) = test_engine_with_state();
    engine.load_buffer(0, periodic_sine()).unwrap();
    assert_eq!(engine.define_inner_loop(0, 0, 3).unwrap(), (0, 3));
    engine.trigger(0, 0, false).unwrap();

    let mut out = Vec::new();
    for _ in 0..20 {
        let (left, _) = render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
        out.extend(left);
    }
    assert!(max_step(&out) < 0.05, "max step {}", max_step(&out));
}

#[test]
fn test_reverse_seam_at_last_column_wraps_post_roll() {
    let (engine, mut state) = test_engine_with_state();
    engine.load_buffer(0, periodic_sine()).unwrap();
    assert_eq!(engine.define_inner_loop(0, 16, 13).unwrap(), (13, 16));
    engine.trigger(0, 15, false).unwrap();

    let mut out = Vec::new();
    for _ in 0..20 {
        let (left, _) = render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
        out.extend(left);
    }
    assert!(max_step(&out) < 0.05, "max step {}", max_step(&out));
}

#[test]
fn test_resampler_is_exact_at_unity_speed() {
    let data = generate_noise(256, 3);
    for quality in [Quality::Linear, Quality::Cubic, Quality::Sinc, Quality::SincHq] {
        let resampler = Resampler::new(quality);
        for (i, &expected) in data.iter().enumerate() {
            assert_eq!(
                resampler.sample(&data, i as f64, 1.0),
                expected,
                "{} at {}",
                quality.name(),
                i
            );
        }
    }
}

#[test]
fn test_one_shot_stops_at_end() {
    let (engine, mut state) = test_engine_with_state();
    engine.load_buffer(0, mono_buffer(vec![0.5; 4800])).unwrap();
    engine.set_play_mode(0, PlayMode::OneShot).unwrap();
    engine.trigger(0, 0, false).unwrap();

    for _ in 0..12 {
        render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    }
    assert!(!engine.strip(0).unwrap().is_playing());
    let (left, _) = render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    assert_is_silent(&left, 0.0, "after one-shot");
}

#[test]
fn test_loop_mode_keeps_playing() {
    let (engine, mut state) = test_engine_with_state();
    engine.load_buffer(0, mono_buffer(vec![0.5; 4800])).unwrap();
    engine.trigger(0, 0, false).unwrap();

    for _ in 0..30 {
        render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    }
    let (left, right) = render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    assert!(engine.strip(0).unwrap().is_playing());
    assert!(signals_approx_equal(&left, &vec![0.5; TEST_BUFFER_SIZE], FLOAT_EPSILON));
    assert!(signals_approx_equal(&right, &left, FLOAT_EPSILON));
}

#[test]
fn test_ping_pong_stays_in_sample() {
    let (engine, mut state) = test_engine_with_state();
    engine
        .load_buffer(0, mono_buffer(generate_staircase(1600)))
        .unwrap();
    engine.set_play_mode(0, PlayMode::PingPong).unwrap();
    engine.trigger(0, 0, false).unwrap();

    let mut out = Vec::new();
    for _ in 0..10 {
        let (left, _) = render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
        out.extend(left);
    }
    assert!(engine.strip(0).unwrap().is_playing());
    // The staircase rises 1/1600 per sample; bouncing never jumps.
    assert!(max_step(&out[200..]) <= 1.0 / 1600.0 + DSP_EPSILON);
}

#[test]
fn test_gate_stops_on_release() {
    let (engine, mut state) = test_engine_with_state();
    engine.load_buffer(0, mono_buffer(vec![0.5; 9600])).unwrap();
    engine.set_play_mode(0, PlayMode::Gate).unwrap();
    engine.trigger(0, 4, false).unwrap();
    render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    assert!(engine.strip(0).unwrap().is_playing());

    engine.release(0, 4).unwrap();
    for _ in 0..2 {
        render(&mut state, &HostTransport::free_running(), TEST_BUFFER_SIZE);
    }
    assert!(!engine.strip(0).unwrap().is_playing());
}

#[test]
fn test_speed_and_reverse_parameters() {
    let (engine, mut state) = test_engine_with_state();
    engine
        .load_buffer(0, mono_buffer(generate_staircase(48_000)))
        .unwrap();
    engine.set_speed(0, 2.0).unwrap();
    engine.trigger(0, 0, false).unwrap();
    render(&mut state, &HostTransport::free_running(), 100);
    assert_eq!(engine.strip(0).unwrap().position(), 200.0);

    engine.set_speed(0, -1.0).unwrap();
    render(&mut state, &HostTransport::free_running(), 100);
    assert_eq!(engine.strip(0).unwrap().position(), 100.0);

    engine.set_speed(0, 100.0).unwrap();
    assert_eq!(engine.strip(0).unwrap().speed(), 4.0);
}

#[test]
fn test_column_led_follows_playhead() {
    let (engine, mut state) = test_engine_with_state();
    engine
        .load_buffer(0, mono_buffer(vec![0.25; 16_000]))
        .unwrap();
    engine.define_inner_loop(0, 4, 8).unwrap();
    engine.trigger(0, 5, false).unwrap();
    render(&mut state, &HostTransport::free_running(), 64);

    let row = &engine.led_rows()[0];
    assert_eq!(row.len(), 16);
    assert_eq!(row[5], 2);
    assert_eq!(row[4], 1);
    assert_eq!(row[9], 0);
}

proptest! {
    #[test]
    fn test_equal_power_sum_is_unity(t in 0.0f32..=1.0) {
        let (fade_out, fade_in) = equal_power(t);
        prop_assert!((fade_out * fade_out + fade_in * fade_in - 1.0).abs() < DSP_EPSILON);
        prop_assert_eq!(CrossfadeCurve::EqualPower.gains(t), (fade_out, fade_in));
    }

    #[test]
    fn test_raised_cosine_sums_to_unity(t in 0.0f32..=1.0) {
        let (fade_out, fade_in) = raised_cosine(t);
        prop_assert!((fade_out + fade_in - 1.0).abs() < DSP_EPSILON);
    }
}
