//! Engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Longest loop crossfade the recorder ever reads as pre-roll.
const MAX_CROSSFADE_MS: f64 = 50.0;

/// Structural configuration for the engine.
///
/// Fixed for the engine's lifetime: everything sized from it (strip slots,
/// the recorder ring, mix scratch) is allocated once at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub max_block_size: usize,
    pub num_strips: usize,
    pub num_columns: usize,
    pub num_groups: usize,
    pub beats_per_bar: u32,
    pub max_capture_bars: u32,
    /// Slowest tempo at which a `max_capture_bars` capture still fits the ring.
    pub min_capture_tempo: f64,
    pub input_channels: usize,
    /// Tempo used while neither the host nor the control path has set one.
    pub fallback_tempo: f64,
    /// Start the strip from column 0 once a capture lands in it.
    pub trigger_after_capture: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 1024,
            num_strips: 6,
            num_columns: 16,
            num_groups: 4,
            beats_per_bar: 4,
            max_capture_bars: 4,
            min_capture_tempo: 40.0,
            input_channels: 2,
            fallback_tempo: 120.0,
            trigger_after_capture: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 || self.max_block_size > 16384 {
            return Err(Error::InvalidConfig(format!(
                "max_block_size {} out of range (1-16384)",
                self.max_block_size
            )));
        }
        if !(1..=16).contains(&self.num_strips) {
            return Err(Error::InvalidConfig(format!(
                "num_strips {} out of range (1-16)",
                self.num_strips
            )));
        }
        if !(1..=64).contains(&self.num_columns) {
            return Err(Error::InvalidConfig(format!(
                "num_columns {} out of range (1-64)",
                self.num_columns
            )));
        }
        if self.num_groups > 16 {
            return Err(Error::InvalidConfig(format!(
                "num_groups {} out of range (0-16)",
                self.num_groups
            )));
        }
        if !(1..=16).contains(&self.beats_per_bar) {
            return Err(Error::InvalidConfig(format!(
                "beats_per_bar {} out of range (1-16)",
                self.beats_per_bar
            )));
        }
        if !(1..=8).contains(&self.max_capture_bars) {
            return Err(Error::InvalidConfig(format!(
                "max_capture_bars {} out of range (1-8)",
                self.max_capture_bars
            )));
        }
        if !(20.0..=999.0).contains(&self.min_capture_tempo) {
            return Err(Error::InvalidTempo(self.min_capture_tempo));
        }
        if !(20.0..=999.0).contains(&self.fallback_tempo) {
            return Err(Error::InvalidTempo(self.fallback_tempo));
        }
        if !(1..=2).contains(&self.input_channels) {
            return Err(Error::InvalidConfig(format!(
                "input_channels {} out of range (1-2)",
                self.input_channels
            )));
        }
        Ok(())
    }

    /// Ring capacity in frames: the longest capture plus its pre-roll and one block of margin.
    pub fn recorder_capacity(&self) -> usize {
        let beats = (self.max_capture_bars * self.beats_per_bar) as f64;
        let longest_loop = beats * 60.0 / self.min_capture_tempo * self.sample_rate;
        let pre_roll = MAX_CROSSFADE_MS * 0.001 * self.sample_rate;
        (longest_loop + pre_roll).ceil() as usize + self.max_block_size
    }
}
