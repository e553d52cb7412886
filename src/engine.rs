//! Engine that owns the strips, the musical clock and the continuous recorder.
//!
//! [`Engine`] is the control side: every method stores into lock-free state
//! or a bounded queue and returns immediately. [`EngineState`] is the audio
//! side: it is taken once with [`Engine::take_processor`] and driven by
//! calling [`EngineState::process`] for every block.

use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::path::Path;
use stripline_core::{
    Arc, AtomicFlag, AtomicFloat, ClockSnapshot, EngineConfig, HostTransport, MusicalClock,
    QuantizeDivision, SharedClockState, SmoothedValue,
};
use stripline_dsp::{PeakMeter, Quality};
use stripline_sampler::{
    load_wav, loop_length_samples, should_blink_record_led, CaptureError, CaptureJob,
    CaptureStatus, ContinuousRecorder, MuteGroups, PlayMode, RecorderHandle, SampleBuffer, Strip,
    StripHandle, StripLeds, StripStatus,
};

/// Capture requests that may wait for the audio context at once.
const CAPTURE_QUEUE_LEN: usize = 4;
/// Replaced buffers in flight back to the control context.
const GARBAGE_QUEUE_LEN: usize = 64;
const GAIN_SMOOTHING_SECS: f32 = 0.010;
const METER_RELEASE_SECS: f64 = 0.3;

/// Mix parameters and meter outputs shared across contexts.
#[derive(Debug)]
struct MixShared {
    master_gain: AtomicFloat,
    monitor_gain: AtomicFloat,
    record_led: AtomicFlag,
}

/// Control side of the engine.
///
/// # Example
///
/// ```
/// use stripline::{Engine, HostTransport, SampleBuffer};
///
/// let engine = Engine::builder().sample_rate(48000.0).strips(2).build().unwrap();
/// let mut state = engine.take_processor().unwrap();
///
/// let tone: Vec<f32> = (0..48_000).map(|i| (i as f32 * 0.01).sin()).collect();
/// engine
///     .load_buffer(0, SampleBuffer::new(vec![tone.clone(), tone], 48000.0).unwrap())
///     .unwrap();
/// engine.trigger(0, 0, false).unwrap();
///
/// let (mut left, mut right) = (vec![0.0f32; 256], vec![0.0f32; 256]);
/// state.process(&HostTransport::free_running(), &[], &mut [&mut left[..], &mut right[..]]);
/// assert!(engine.leds()[0].playing);
/// ```
pub struct Engine {
    config: EngineConfig,
    strips: Vec<StripHandle>,
    groups: MuteGroups,
    clock: Arc<SharedClockState>,
    recorder: RecorderHandle,
    mix: Arc<MixShared>,
    input_levels: [Arc<AtomicFloat>; 2],
    output_levels: [Arc<AtomicFloat>; 2],
    capture_tx: Sender<CaptureJob>,
    garbage_rx: Receiver<Arc<SampleBuffer>>,
    last_capture: Mutex<CaptureStatus>,
    processor: Mutex<Option<EngineState>>,
}

impl Engine {
    pub fn builder() -> crate::EngineBuilder {
        crate::EngineBuilder::default()
    }

    /// Build an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let sr = config.sample_rate;
        let clock =
            MusicalClock::new(sr, config.fallback_tempo).with_beats_per_bar(config.beats_per_bar);
        let (strips, handles): (Vec<_>, Vec<_>) = (0..config.num_strips)
            .map(|i| Strip::new(i, config.num_columns as u32, sr))
            .unzip();
        let groups = MuteGroups::new(config.num_groups);
        let recorder =
            ContinuousRecorder::new(config.input_channels, config.recorder_capacity(), sr);
        let (capture_tx, capture_rx) = bounded(CAPTURE_QUEUE_LEN);
        let (garbage_tx, garbage_rx) = bounded(GARBAGE_QUEUE_LEN);
        let mix = Arc::new(MixShared {
            master_gain: AtomicFloat::new(1.0),
            monitor_gain: AtomicFloat::new(0.0),
            record_led: AtomicFlag::new(false),
        });

        let input_meters = [
            PeakMeter::new(sr, METER_RELEASE_SECS),
            PeakMeter::new(sr, METER_RELEASE_SECS),
        ];
        let output_meters = [
            PeakMeter::new(sr, METER_RELEASE_SECS),
            PeakMeter::new(sr, METER_RELEASE_SECS),
        ];
        let input_levels = [input_meters[0].shared(), input_meters[1].shared()];
        let output_levels = [output_meters[0].shared(), output_meters[1].shared()];

        let block = config.max_block_size;
        let clock_shared = clock.shared();
        let recorder_handle = recorder.handle();
        let state = EngineState {
            max_block_size: block,
            clock,
            strips,
            handles: handles.clone(),
            groups: groups.clone(),
            recorder_handle: recorder_handle.clone(),
            recorder,
            captures: capture_rx,
            garbage: garbage_tx,
            stranded: Vec::with_capacity(GARBAGE_QUEUE_LEN),
            mix: Arc::clone(&mix),
            master: SmoothedValue::new(1.0, GAIN_SMOOTHING_SECS, sr as f32),
            monitor: SmoothedValue::new(0.0, GAIN_SMOOTHING_SECS, sr as f32),
            input_meters,
            output_meters,
            mix_l: vec![0.0; block],
            mix_r: vec![0.0; block],
            in_l: vec![0.0; block],
            in_r: vec![0.0; block],
        };

        tracing::info!(
            sample_rate = sr,
            strips = config.num_strips,
            columns = config.num_columns,
            recorder_frames = state.recorder.capacity(),
            "Engine created"
        );

        Ok(Self {
            clock: clock_shared,
            recorder: recorder_handle,
            config,
            strips: handles,
            groups,
            mix,
            input_levels,
            output_levels,
            capture_tx,
            garbage_rx,
            last_capture: Mutex::new(CaptureStatus::Idle),
            processor: Mutex::new(Some(state)),
        })
    }

    /// Hand out the audio-side processor. Available once.
    pub fn take_processor(&self) -> Option<EngineState> {
        self.processor.lock().take()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn num_strips(&self) -> usize {
        self.strips.len()
    }

    pub fn num_columns(&self) -> u32 {
        self.config.num_columns as u32
    }

    /// Direct handle for parameters without an engine-level setter.
    pub fn strip(&self, index: usize) -> Result<&StripHandle> {
        self.strips.get(index).ok_or_else(|| {
            stripline_sampler::Error::InvalidStrip {
                index,
                count: self.strips.len(),
            }
            .into()
        })
    }

    pub fn strips(&self) -> &[StripHandle] {
        &self.strips
    }

    // =========================================================================
    // Strip transport
    // =========================================================================

    /// Start `strip` from `column`, stopping the other members of its group.
    ///
    /// Returns false when the strip has no sample; the strip then reports
    /// [`StripStatus::NoSample`].
    pub fn trigger(&self, strip: usize, column: u32, quantized: bool) -> Result<bool> {
        self.strip(strip)?;
        Ok(trigger_exclusive(
            &self.strips,
            &self.groups,
            strip,
            column,
            quantized,
            false,
        ))
    }

    /// Like [`trigger`](Self::trigger), but the strip's inner loop is cleared
    /// when the trigger fires, on the grid when `quantized`.
    ///
    /// Without a sample the loop is cleared at once and false is returned.
    pub fn trigger_clearing_loop(&self, strip: usize, column: u32, quantized: bool) -> Result<bool> {
        self.strip(strip)?;
        Ok(trigger_exclusive(
            &self.strips,
            &self.groups,
            strip,
            column,
            quantized,
            true,
        ))
    }

    pub fn stop(&self, strip: usize, immediate: bool) -> Result<()> {
        self.strip(strip)?.stop(immediate);
        Ok(())
    }

    pub fn stop_all(&self, immediate: bool) {
        for handle in &self.strips {
            handle.stop(immediate);
        }
    }

    pub fn release(&self, strip: usize, column: u32) -> Result<()> {
        self.strip(strip)?.release(column);
        Ok(())
    }

    pub fn define_inner_loop(&self, strip: usize, first: u32, second: u32) -> Result<(u32, u32)> {
        Ok(self.strip(strip)?.define_inner_loop(first, second))
    }

    pub fn clear_inner_loop(&self, strip: usize) -> Result<()> {
        self.strip(strip)?.clear_inner_loop();
        Ok(())
    }

    /// Bake the pre-roll seam of the strip's inner loop into its sample.
    pub fn bake_inner_loop(&self, strip: usize) -> Result<usize> {
        Ok(self.strip(strip)?.bake_inner_loop())
    }

    // =========================================================================
    // Strip parameters (clamped, never fail on value)
    // =========================================================================

    pub fn set_volume(&self, strip: usize, volume: f32) -> Result<()> {
        self.strip(strip)?.set_volume(volume);
        Ok(())
    }

    pub fn set_pan(&self, strip: usize, pan: f32) -> Result<()> {
        self.strip(strip)?.set_pan(pan);
        Ok(())
    }

    pub fn set_speed(&self, strip: usize, speed: f32) -> Result<()> {
        self.strip(strip)?.set_speed(speed);
        Ok(())
    }

    pub fn set_pitch(&self, strip: usize, semitones: f32) -> Result<()> {
        self.strip(strip)?.set_pitch(semitones);
        Ok(())
    }

    pub fn set_quality(&self, strip: usize, quality: Quality) -> Result<()> {
        self.strip(strip)?.set_quality(quality);
        Ok(())
    }

    pub fn set_play_mode(&self, strip: usize, mode: PlayMode) -> Result<()> {
        self.strip(strip)?.set_play_mode(mode);
        Ok(())
    }

    pub fn set_reverse(&self, strip: usize, reverse: bool) -> Result<()> {
        self.strip(strip)?.set_reverse(reverse);
        Ok(())
    }

    pub fn set_loop_crossfade_ms(&self, strip: usize, ms: f32) -> Result<()> {
        self.strip(strip)?.set_loop_crossfade_ms(ms);
        Ok(())
    }

    pub fn set_trigger_fade_ms(&self, strip: usize, ms: f32) -> Result<()> {
        self.strip(strip)?.set_trigger_fade_ms(ms);
        Ok(())
    }

    // =========================================================================
    // Samples
    // =========================================================================

    pub fn load_sample(&self, strip: usize, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.strip(strip)?;
        let buffer = load_wav(path)?;
        tracing::info!(strip, path = %path.display(), "Sample file decoded");
        self.load_buffer(strip, buffer)
    }

    pub fn load_buffer(&self, strip: usize, buffer: SampleBuffer) -> Result<()> {
        let handle = self.strip(strip)?;
        tracing::debug!(
            strip,
            frames = buffer.len(),
            channels = buffer.num_channels(),
            sample_rate = buffer.sample_rate(),
            "Sample loaded"
        );
        let old = handle.load(Arc::new(buffer));
        drop(old);
        Ok(())
    }

    pub fn clear_sample(&self, strip: usize) -> Result<()> {
        let old = self.strip(strip)?.clear_sample();
        drop(old);
        Ok(())
    }

    // =========================================================================
    // Recorder
    // =========================================================================

    /// Capture the last `bars` bars of input into `strip`.
    ///
    /// `bars` is clamped to `1..=max_capture_bars`. The loop length follows
    /// the current clock tempo. The destination is allocated here and filled
    /// by the audio context at the next block boundary; poll
    /// [`capture_status`](Self::capture_status) for the outcome.
    pub fn request_capture(&self, strip: usize, bars: u32) -> Result<CaptureStatus> {
        self.strip(strip)?;
        let bars = bars.clamp(1, self.config.max_capture_bars);
        let tempo = self.clock.tempo();
        let len = loop_length_samples(
            tempo,
            bars,
            self.config.beats_per_bar,
            self.config.sample_rate,
        );
        let crossfade = self.recorder.crossfade_samples();
        let needed = len + crossfade.min(len / 2);
        if len == 0 || needed > self.recorder.capacity() {
            tracing::warn!(
                strip,
                bars,
                tempo,
                needed,
                capacity = self.recorder.capacity(),
                "Capture does not fit the recorder"
            );
            self.recorder.set_status(CaptureStatus::InsufficientHistory);
            return Ok(CaptureStatus::InsufficientHistory);
        }

        let job = CaptureJob::new(
            strip,
            len,
            self.config.input_channels,
            self.config.sample_rate,
        )
        .with_crossfade(crossfade)
        .with_trigger(self.config.trigger_after_capture);

        self.recorder.set_status(CaptureStatus::Pending);
        if self.capture_tx.try_send(job).is_err() {
            tracing::warn!(strip, "Capture queue full");
            self.recorder.set_status(CaptureStatus::Busy);
            return Ok(CaptureStatus::Busy);
        }
        tracing::debug!(strip, bars, tempo, len, crossfade, "Capture requested");
        Ok(CaptureStatus::Pending)
    }

    /// Bars [`request_capture_default`](Self::request_capture_default)
    /// captures into `strip`. Range: 1 to 8.
    pub fn set_recording_bars(&self, strip: usize, bars: u32) -> Result<()> {
        self.strip(strip)?.set_recording_bars(bars);
        Ok(())
    }

    /// Capture into `strip` using its own recording length.
    pub fn request_capture_default(&self, strip: usize) -> Result<CaptureStatus> {
        let bars = self.strip(strip)?.recording_bars();
        self.request_capture(strip, bars)
    }

    /// Range: 1 to 50 ms. Returns the stored value.
    pub fn set_crossfade_ms(&self, ms: f32) -> f32 {
        self.recorder.set_crossfade_ms(ms)
    }

    pub fn clear_recorder(&self) {
        self.recorder.clear();
    }

    pub fn recorder(&self) -> &RecorderHandle {
        &self.recorder
    }

    pub fn capture_status(&self) -> CaptureStatus {
        self.recorder.status()
    }

    pub fn recording_progress(&self) -> f32 {
        self.recorder.recording_progress()
    }

    /// Record button LED, blinking on the beat.
    pub fn record_led(&self) -> bool {
        self.mix.record_led.get()
    }

    // =========================================================================
    // Transport
    // =========================================================================

    pub fn set_quantization(&self, division: QuantizeDivision) {
        self.clock.set_quantization(division);
    }

    pub fn quantization(&self) -> QuantizeDivision {
        self.clock.quantization()
    }

    /// Free-running tempo, clamped to 20..=999 BPM. Host tempo takes
    /// precedence while the host supplies one.
    pub fn set_tempo(&self, bpm: f64) -> f64 {
        let tempo = self.clock.set_tempo(bpm);
        tracing::debug!(tempo, "Tempo set");
        tempo
    }

    pub fn reset_clock(&self) {
        self.clock.request_reset();
    }

    pub fn clock(&self) -> ClockSnapshot {
        self.clock.snapshot()
    }

    // =========================================================================
    // Mix
    // =========================================================================

    /// Range: 0 to 2.
    pub fn set_master_gain(&self, gain: f32) {
        self.mix.master_gain.set_clamped(gain, 0.0, 2.0);
    }

    pub fn master_gain(&self) -> f32 {
        self.mix.master_gain.get()
    }

    /// Range: 0 to 2. 0 disables monitoring.
    pub fn set_input_monitor_gain(&self, gain: f32) {
        self.mix.monitor_gain.set_clamped(gain, 0.0, 2.0);
    }

    pub fn input_monitor_gain(&self) -> f32 {
        self.mix.monitor_gain.get()
    }

    pub fn assign_group(&self, strip: usize, group: Option<usize>) -> Result<()> {
        self.strip(strip)?;
        self.groups.assign(strip, group)?;
        Ok(())
    }

    pub fn set_group_volume(&self, group: usize, volume: f32) -> Result<()> {
        Ok(self.groups.set_volume(group, volume)?)
    }

    pub fn set_group_muted(&self, group: usize, muted: bool) -> Result<()> {
        Ok(self.groups.set_muted(group, muted)?)
    }

    pub fn groups(&self) -> &MuteGroups {
        &self.groups
    }

    // =========================================================================
    // Feedback
    // =========================================================================

    pub fn leds(&self) -> Vec<StripLeds> {
        self.strips.iter().map(StripHandle::leds).collect()
    }

    /// Per-column brightness for every strip (0 off, 1 loop range, 2 playhead).
    pub fn led_rows(&self) -> Vec<Vec<u8>> {
        self.strips.iter().map(StripHandle::led_row).collect()
    }

    pub fn status(&self, strip: usize) -> Result<StripStatus> {
        Ok(self.strip(strip)?.status())
    }

    pub fn input_levels(&self) -> (f32, f32) {
        (self.input_levels[0].get(), self.input_levels[1].get())
    }

    pub fn output_levels(&self) -> (f32, f32) {
        (self.output_levels[0].get(), self.output_levels[1].get())
    }

    /// Control-context housekeeping. Call periodically.
    ///
    /// Releases buffers replaced on the audio side, logs capture outcomes,
    /// and returns (and resets) every strip status other than `Ok`.
    pub fn poll_status(&self) -> Vec<(usize, StripStatus)> {
        let released = self.garbage_rx.try_iter().count();
        if released > 0 {
            tracing::trace!(released, "Released replaced buffers");
        }

        let capture = self.recorder.status();
        let mut last = self.last_capture.lock();
        if capture != *last {
            match capture {
                CaptureStatus::Captured => tracing::info!("Loop captured"),
                CaptureStatus::InsufficientHistory => tracing::warn!(
                    history = self.recorder.history_len(),
                    "Capture skipped, not enough recorded history"
                ),
                CaptureStatus::Busy => tracing::warn!("Capture dropped, strip busy"),
                CaptureStatus::Idle | CaptureStatus::Pending => {}
            }
            *last = capture;
        }
        drop(last);

        let mut reports = Vec::new();
        for handle in &self.strips {
            let status = handle.take_status();
            match status {
                StripStatus::Ok => continue,
                StripStatus::Fault => {
                    tracing::warn!(strip = handle.index(), "Strip stopped after playback fault")
                }
                StripStatus::NoSample => {
                    tracing::debug!(strip = handle.index(), "Strip triggered without sample")
                }
            }
            reports.push((handle.index(), status));
        }
        reports
    }
}

/// Trigger `strip` and fade out the other members of its group.
fn trigger_exclusive(
    handles: &[StripHandle],
    groups: &MuteGroups,
    strip: usize,
    column: u32,
    quantized: bool,
    clear_loop: bool,
) -> bool {
    let Some(handle) = handles.get(strip) else {
        return false;
    };
    let fired = if clear_loop {
        handle.trigger_clearing_loop(column, quantized)
    } else {
        handle.trigger(column, quantized)
    };
    if !fired {
        return false;
    }
    for other in groups.others_in_group(strip) {
        if let Some(h) = handles.get(other) {
            h.stop(false);
        }
    }
    true
}

/// Audio side of the engine: explicit state for the block entry point.
///
/// Nothing here allocates, blocks or logs once constructed.
pub struct EngineState {
    max_block_size: usize,
    clock: MusicalClock,
    strips: Vec<Strip>,
    handles: Vec<StripHandle>,
    groups: MuteGroups,
    recorder: ContinuousRecorder,
    recorder_handle: RecorderHandle,
    captures: Receiver<CaptureJob>,
    garbage: Sender<Arc<SampleBuffer>>,
    /// Buffers the garbage queue could not take yet. Never grows past its
    /// initial capacity.
    stranded: Vec<Arc<SampleBuffer>>,
    mix: Arc<MixShared>,
    master: SmoothedValue,
    monitor: SmoothedValue,
    input_meters: [PeakMeter; 2],
    output_meters: [PeakMeter; 2],
    mix_l: Vec<f32>,
    mix_r: Vec<f32>,
    in_l: Vec<f32>,
    in_r: Vec<f32>,
}

impl EngineState {
    /// Process one host buffer.
    ///
    /// `input` holds up to two planar input channels (missing channels are
    /// silent, a single channel feeds both sides). `output` receives left
    /// and right in its first two channels; a single output channel gets
    /// the mono sum. Buffers longer than `max_block_size` are split, with
    /// the host position advanced for each chunk.
    pub fn process(
        &mut self,
        host: &HostTransport,
        input: &[&[f32]],
        output: &mut [&mut [f32]],
    ) {
        let frames = output.iter().map(|ch| ch.len()).min().unwrap_or(0);
        let mut transport = *host;
        let mut offset = 0;
        while offset < frames {
            let n = (frames - offset).min(self.max_block_size);
            self.process_block(&transport, input, output, offset, n);
            if transport.is_playing {
                if let Some(beat) = transport.musical_position.as_mut() {
                    *beat = self.clock.beat_at_offset(n);
                }
            }
            offset += n;
        }
    }

    fn process_block(
        &mut self,
        host: &HostTransport,
        input: &[&[f32]],
        output: &mut [&mut [f32]],
        offset: usize,
        n: usize,
    ) {
        self.flush_stranded();
        self.master.set_target(self.mix.master_gain.get());
        self.monitor.set_target(self.mix.monitor_gain.get());

        self.clock.update(host, n);

        let mix_l = &mut self.mix_l[..n];
        let mix_r = &mut self.mix_r[..n];
        mix_l.fill(0.0);
        mix_r.fill(0.0);
        for strip in &mut self.strips {
            let gain = self.groups.gain_for(strip.index());
            strip.process(&self.clock, gain, mix_l, mix_r);
        }

        copy_input(input, offset, &mut self.in_l[..n], &mut self.in_r[..n]);
        self.recorder.write(&[&self.in_l[..n], &self.in_r[..n]]);

        self.service_capture();

        let mix_l = &mut self.mix_l[..n];
        let mix_r = &mut self.mix_r[..n];
        let in_l = &self.in_l[..n];
        let in_r = &self.in_r[..n];
        for k in 0..n {
            let monitor = self.monitor.next_sample();
            mix_l[k] += in_l[k] * monitor;
            mix_r[k] += in_r[k] * monitor;
        }
        self.master.apply_gain_stereo(mix_l, mix_r);

        self.input_meters[0].process(in_l);
        self.input_meters[1].process(in_r);
        self.output_meters[0].process(mix_l);
        self.output_meters[1].process(mix_r);

        write_output(output, offset, mix_l, mix_r);

        self.mix
            .record_led
            .set(should_blink_record_led(self.clock.beat()));
    }

    /// Fill and install at most one pending capture.
    fn service_capture(&mut self) {
        let Ok(mut job) = self.captures.try_recv() else {
            return;
        };
        let status = match self.recorder.fulfil(&mut job) {
            Ok(_) => self.install_capture(job),
            Err(err) => {
                self.discard(job.buffer);
                match err {
                    CaptureError::DestinationShared => CaptureStatus::Busy,
                    CaptureError::InsufficientHistory { .. }
                    | CaptureError::ExceedsCapacity { .. }
                    | CaptureError::Empty => CaptureStatus::InsufficientHistory,
                }
            }
        };
        self.recorder_handle.set_status(status);
    }

    fn install_capture(&mut self, job: CaptureJob) -> CaptureStatus {
        let CaptureJob {
            strip,
            buffer,
            trigger_after,
            ..
        } = job;
        let Some(target) = self.strips.get_mut(strip) else {
            self.discard(buffer);
            return CaptureStatus::Busy;
        };
        match target.try_install(buffer) {
            Ok(old) => {
                self.discard(old);
                if trigger_after {
                    trigger_exclusive(&self.handles, &self.groups, strip, 0, false, false);
                }
                CaptureStatus::Captured
            }
            Err(buffer) => {
                self.discard(buffer);
                CaptureStatus::Busy
            }
        }
    }

    /// Send a buffer to the control context for deallocation.
    fn discard(&mut self, buffer: Arc<SampleBuffer>) {
        let Err(err) = self.garbage.try_send(buffer) else {
            return;
        };
        if err.is_full() && self.stranded.len() < self.stranded.capacity() {
            self.stranded.push(err.into_inner());
        }
    }

    fn flush_stranded(&mut self) {
        while let Some(buffer) = self.stranded.pop() {
            if let Err(err) = self.garbage.try_send(buffer) {
                if err.is_full() {
                    self.stranded.push(err.into_inner());
                }
                break;
            }
        }
    }

    pub fn clock(&self) -> &MusicalClock {
        &self.clock
    }

    pub fn recorder(&self) -> &ContinuousRecorder {
        &self.recorder
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn num_strips(&self) -> usize {
        self.strips.len()
    }
}

/// Copy `n` frames of host input starting at `offset` into the scratch
/// channels, zero-filling whatever the host did not supply.
fn copy_input(input: &[&[f32]], offset: usize, left: &mut [f32], right: &mut [f32]) {
    for (ch, dest) in [left, right].into_iter().enumerate() {
        let Some(src) = input.get(ch).or_else(|| input.first()) else {
            dest.fill(0.0);
            continue;
        };
        let available = src.len().saturating_sub(offset).min(dest.len());
        dest[..available].copy_from_slice(&src[offset..offset + available]);
        dest[available..].fill(0.0);
    }
}

fn write_output(output: &mut [&mut [f32]], offset: usize, left: &[f32], right: &[f32]) {
    let n = left.len();
    match output {
        [] => {}
        [mono] => {
            for (k, out) in mono[offset..offset + n].iter_mut().enumerate() {
                *out = 0.5 * (left[k] + right[k]);
            }
        }
        [out_l, out_r, rest @ ..] => {
            out_l[offset..offset + n].copy_from_slice(left);
            out_r[offset..offset + n].copy_from_slice(right);
            for ch in rest {
                ch[offset..offset + n].fill(0.0);
            }
        }
    }
}
