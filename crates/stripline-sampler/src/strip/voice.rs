//! Per-sample playback: position, wrapping, seam crossfade and play modes.

use super::mode::PlayMode;
use stripline_dsp::{crossfade_progress, equal_power, raised_cosine, CrossfadeCurve, FadeRamp, Resampler};

/// Beats per step in Step mode (one sixteenth note).
pub const STEP_BEATS: f64 = 0.25;

/// Everything the voice needs for one block, resolved once from the shared
/// atomics and the current buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockParams {
    pub len: usize,
    pub num_columns: u32,
    /// Region `[start, end)` in source samples.
    pub start: usize,
    pub end: usize,
    pub mode: PlayMode,
    /// Signed source samples advanced per output sample.
    pub step: f64,
    /// Seam crossfade length, limited by the audio outside the region.
    pub seam_crossfade: usize,
    pub trigger_fade: usize,
    pub grain_len: f64,
    pub step_pattern: u64,
    pub step_count: u32,
}

impl BlockParams {
    #[inline]
    fn loop_len(&self) -> f64 {
        (self.end - self.start) as f64
    }

    #[inline]
    fn backward(&self) -> bool {
        self.step < 0.0
    }

    /// Where playback enters the region for a fresh pass.
    #[inline]
    fn entry(&self) -> f64 {
        if self.backward() {
            (self.end - 1) as f64
        } else {
            self.start as f64
        }
    }
}

/// Raised-cosine grain window over phase `[0, 1)`. Two windows half a period
/// apart sum to one.
#[inline]
pub(crate) fn grain_window(phase: f64) -> f32 {
    let phase = phase as f32;
    if phase < 0.5 {
        raised_cosine(2.0 * phase).1
    } else {
        raised_cosine(2.0 * phase - 1.0).0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Voice {
    position: f64,
    playing: bool,
    /// False while a Step-mode strip waits for its next enabled step.
    sounding: bool,
    faulted: bool,
    ping_pong_forward: bool,
    anchor: f64,
    grain_phase: f64,
    last_step: Option<u64>,
    fade: FadeRamp,
    resampler: Resampler,
}

impl Voice {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            playing: false,
            sounding: false,
            faulted: false,
            ping_pong_forward: true,
            anchor: 0.0,
            grain_phase: 0.0,
            last_step: None,
            fade: FadeRamp::new(CrossfadeCurve::RaisedCosine),
            resampler: Resampler::default(),
        }
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Set when playback was forced to stop by a non-finite position.
    pub fn take_fault(&mut self) -> bool {
        std::mem::take(&mut self.faulted)
    }

    pub fn resampler_mut(&mut self) -> &mut Resampler {
        &mut self.resampler
    }

    /// Start playback at `column` with a fade-in.
    pub fn fire(&mut self, column: u32, p: &BlockParams) {
        let col = column.min(p.num_columns.saturating_sub(1)) as u64;
        let mut pos = (col * p.len as u64 / p.num_columns.max(1) as u64) as f64;
        if pos < p.start as f64 || pos >= p.end as f64 {
            pos = p.entry();
        }
        self.position = pos;
        self.anchor = pos;
        self.grain_phase = 0.0;
        self.last_step = None;
        self.ping_pong_forward = !p.backward();
        self.playing = true;
        self.sounding = p.mode != PlayMode::Step;
        self.fade.start_from(0.0, true, p.trigger_fade);
    }

    pub fn stop(&mut self, immediate: bool, fade_len: usize) {
        if !self.playing {
            return;
        }
        if immediate || !self.sounding {
            self.playing = false;
            self.sounding = false;
            self.fade.set(0.0);
        } else {
            self.fade.start(false, fade_len);
        }
    }

    /// Render one stereo frame and advance.
    #[inline]
    pub fn render(&mut self, left: &[f32], right: &[f32], p: &BlockParams, beat: f64) -> (f32, f32) {
        if !self.playing {
            return (0.0, 0.0);
        }
        if p.mode == PlayMode::Step {
            self.tick_step(beat, p);
        }
        if !self.sounding {
            return (0.0, 0.0);
        }

        let gain = self.fade.next_gain();
        let (l, r) = if p.mode == PlayMode::Grain {
            self.grain_frame(left, right, p)
        } else {
            let frame = self.frame(left, right, p);
            self.advance(p);
            frame
        };

        if !self.position.is_finite() {
            self.playing = false;
            self.sounding = false;
            self.faulted = true;
            self.fade.set(0.0);
            return (0.0, 0.0);
        }
        if self.fade.is_silent() {
            self.playing = false;
            self.sounding = false;
        }
        (l * gain, r * gain)
    }

    fn frame(&self, left: &[f32], right: &[f32], p: &BlockParams) -> (f32, f32) {
        let pos = self.position;
        let speed = p.step.abs();
        let mut l = self.resampler.sample(left, pos, speed);
        let mut r = self.resampler.sample(right, pos, speed);

        if p.mode.wraps() {
            if let Some((pre_pos, t)) = self.seam(p) {
                let (fade_out, fade_in) = equal_power(t);
                l = fade_out * l + fade_in * self.resampler.sample(left, pre_pos, speed);
                r = fade_out * r + fade_in * self.resampler.sample(right, pre_pos, speed);
            }
        }
        (l, r)
    }

    /// Pre-roll read position and crossfade progress when inside the seam.
    ///
    /// Forward: the last `C` samples before `end` blend into the `C` samples
    /// before `start`. Backward: the first `C` samples after `start` blend
    /// into the `C` samples after `end`. Either side wraps around the sample
    /// edges and never overlaps the loop.
    #[inline]
    fn seam(&self, p: &BlockParams) -> Option<(f64, f32)> {
        let pos = self.position;
        let xf = p.seam_crossfade;
        if xf == 0 {
            return None;
        }
        let len = p.len as f64;
        if p.backward() {
            let d = pos - p.start as f64;
            if !(0.0..xf as f64).contains(&d) {
                return None;
            }
            let i = xf - 1 - (d.floor() as usize).min(xf - 1);
            let mut post = p.end as f64 + d;
            if post >= len {
                post -= len;
            }
            Some((post, crossfade_progress(i, xf)))
        } else {
            let seam_start = (p.end - xf) as f64;
            let d = pos - seam_start;
            if !(0.0..xf as f64).contains(&d) {
                return None;
            }
            let i = (d.floor() as usize).min(xf - 1);
            let mut pre = p.start as f64 - xf as f64 + d;
            if pre < 0.0 {
                pre += len;
            }
            Some((pre, crossfade_progress(i, xf)))
        }
    }

    fn advance(&mut self, p: &BlockParams) {
        let start = p.start as f64;
        let end = p.end as f64;

        match p.mode {
            PlayMode::PingPong => {
                let magnitude = p.step.abs();
                let last = end - 1.0;
                self.position += if self.ping_pong_forward { magnitude } else { -magnitude };
                if self.position > last {
                    self.position = (2.0 * last - self.position).max(start);
                    self.ping_pong_forward = false;
                } else if self.position < start {
                    self.position = (2.0 * start - self.position).min(last);
                    self.ping_pong_forward = true;
                }
            }
            PlayMode::OneShot | PlayMode::Step => {
                self.position += p.step;
                if self.position >= end || self.position < start {
                    self.sounding = false;
                    if p.mode == PlayMode::OneShot {
                        self.playing = false;
                    }
                    self.position = self.position.clamp(start, end - 1.0);
                }
            }
            _ => {
                self.position += p.step;
                if self.position >= end || self.position < start {
                    self.position = start + (self.position - start).rem_euclid(p.loop_len());
                }
            }
        }
    }

    fn tick_step(&mut self, beat: f64, p: &BlockParams) {
        if beat < 0.0 {
            return;
        }
        let index = (beat / STEP_BEATS + 1e-9).floor() as u64;
        if self.last_step == Some(index) {
            return;
        }
        self.last_step = Some(index);
        let step = (index % p.step_count.max(1) as u64) as u32;
        if p.step_pattern & (1u64 << step) != 0 {
            self.position = p.entry();
            self.sounding = true;
            self.fade.start_from(0.0, true, p.trigger_fade);
        }
    }

    fn grain_frame(&mut self, left: &[f32], right: &[f32], p: &BlockParams) -> (f32, f32) {
        let size = p.grain_len;
        let direction = if p.backward() { -1.0 } else { 1.0 };
        let speed = p.step.abs();
        let start = p.start as f64;
        let loop_len = p.loop_len();

        let phase_a = self.grain_phase;
        let phase_b = (phase_a + 0.5).fract();
        let wrap = |pos: f64| start + (pos - start).rem_euclid(loop_len);
        let pos_a = wrap(self.anchor + direction * phase_a * size);
        let pos_b = wrap(self.anchor + direction * phase_b * size);
        let (wa, wb) = (grain_window(phase_a), grain_window(phase_b));

        let l = wa * self.resampler.sample(left, pos_a, speed)
            + wb * self.resampler.sample(left, pos_b, speed);
        let r = wa * self.resampler.sample(right, pos_a, speed)
            + wb * self.resampler.sample(right, pos_b, speed);

        self.position = pos_a;
        self.grain_phase = (phase_a + speed / size).fract();
        (l, r)
    }
}
