//! Host transport input.

/// Which source drives the clock for the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ClockMode {
    /// Internal accumulator at the configured tempo.
    #[default]
    FreeRunning = 0,
    /// Beat position copied from the host every block.
    HostSynced = 1,
}

impl ClockMode {
    pub(crate) fn from_u8(val: u8) -> Self {
        match val {
            1 => ClockMode::HostSynced,
            _ => ClockMode::FreeRunning,
        }
    }
}

/// Transport state reported by the host for one processing block.
///
/// A missing `musical_position` switches the clock to free-running for
/// that block; a missing `tempo` keeps the internally configured tempo.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostTransport {
    pub is_playing: bool,
    pub musical_position: Option<f64>,
    pub tempo: Option<f64>,
}

impl HostTransport {
    /// Standalone operation: no host position, clock always running.
    pub fn free_running() -> Self {
        Self {
            is_playing: true,
            musical_position: None,
            tempo: None,
        }
    }

    /// Host-synced block at `beat`.
    pub fn host(is_playing: bool, beat: f64, tempo: Option<f64>) -> Self {
        Self {
            is_playing,
            musical_position: Some(beat),
            tempo,
        }
    }

    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo = Some(bpm);
        self
    }

    /// Mode this snapshot selects. Non-finite positions count as absent.
    pub fn mode(&self) -> ClockMode {
        match self.musical_position {
            Some(beat) if beat.is_finite() => ClockMode::HostSynced,
            _ => ClockMode::FreeRunning,
        }
    }
}
