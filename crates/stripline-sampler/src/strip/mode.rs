//! Play modes and per-strip status codes.

use serde::{Deserialize, Serialize};

/// How a strip moves through its region once triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayMode {
    /// Play to the region end, then stop.
    OneShot = 0,
    #[default]
    Loop = 1,
    /// Loop while the triggering column is held.
    Gate = 2,
    Reverse = 3,
    PingPong = 4,
    /// Retrigger on enabled steps of a sixteenth-note pattern.
    Step = 5,
    /// Frozen overlapping grains around the triggered column.
    Grain = 6,
}

impl PlayMode {
    pub const ALL: [PlayMode; 7] = [
        PlayMode::OneShot,
        PlayMode::Loop,
        PlayMode::Gate,
        PlayMode::Reverse,
        PlayMode::PingPong,
        PlayMode::Step,
        PlayMode::Grain,
    ];

    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => Self::OneShot,
            2 => Self::Gate,
            3 => Self::Reverse,
            4 => Self::PingPong,
            5 => Self::Step,
            6 => Self::Grain,
            _ => Self::Loop,
        }
    }

    /// Modes that wrap from the loop end to the loop start.
    #[inline]
    pub fn wraps(self) -> bool {
        matches!(self, Self::Loop | Self::Gate | Self::Reverse)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OneShot => "one-shot",
            Self::Loop => "loop",
            Self::Gate => "gate",
            Self::Reverse => "reverse",
            Self::PingPong => "ping-pong",
            Self::Step => "step",
            Self::Grain => "grain",
        }
    }
}

/// Condition published by the audio context for the control context to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StripStatus {
    #[default]
    Ok = 0,
    /// A trigger arrived while no sample was loaded.
    NoSample = 1,
    /// Playback hit an unrecoverable state and was forced to stop.
    Fault = 2,
}

impl StripStatus {
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => Self::NoSample,
            2 => Self::Fault,
            _ => Self::Ok,
        }
    }
}
