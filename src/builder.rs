//! Builder for configuring and constructing an [`Engine`].

use crate::{Engine, Result};
use stripline_core::EngineConfig;

/// Fluent setters over [`EngineConfig`]. Validation happens in
/// [`build`](EngineBuilder::build).
///
/// # Example
///
/// ```
/// use stripline::Engine;
///
/// let engine = Engine::builder()
///     .sample_rate(44100.0)
///     .strips(8)
///     .columns(16)
///     .tempo(96.0)
///     .build()
///     .unwrap();
/// assert_eq!(engine.num_strips(), 8);
///
/// assert!(Engine::builder().strips(0).build().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Start from an existing configuration, e.g. one deserialized from disk.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Default: 48000
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 1024
    pub fn max_block_size(mut self, frames: usize) -> Self {
        self.config.max_block_size = frames;
        self
    }

    /// Default: 6
    pub fn strips(mut self, count: usize) -> Self {
        self.config.num_strips = count;
        self
    }

    /// Default: 16
    pub fn columns(mut self, count: usize) -> Self {
        self.config.num_columns = count;
        self
    }

    /// Default: 4
    pub fn groups(mut self, count: usize) -> Self {
        self.config.num_groups = count;
        self
    }

    /// Default: 4
    pub fn beats_per_bar(mut self, beats: u32) -> Self {
        self.config.beats_per_bar = beats;
        self
    }

    /// Longest capture, in bars. Default: 4
    pub fn max_capture_bars(mut self, bars: u32) -> Self {
        self.config.max_capture_bars = bars;
        self
    }

    /// Slowest tempo the recorder ring is sized for. Default: 40
    pub fn min_capture_tempo(mut self, bpm: f64) -> Self {
        self.config.min_capture_tempo = bpm;
        self
    }

    /// 1 or 2. Default: 2
    pub fn input_channels(mut self, count: usize) -> Self {
        self.config.input_channels = count;
        self
    }

    /// Free-running tempo until set otherwise. Default: 120
    pub fn tempo(mut self, bpm: f64) -> Self {
        self.config.fallback_tempo = bpm;
        self
    }

    /// Default: true
    pub fn trigger_after_capture(mut self, enabled: bool) -> Self {
        self.config.trigger_after_capture = enabled;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn build(self) -> Result<Engine> {
        Engine::new(self.config)
    }
}
