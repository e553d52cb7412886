//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hound error.
    #[error("Hound error: {0}")]
    Wav(#[from] hound::Error),

    /// Strip index out of range.
    #[error("Strip {index} out of range (have {count})")]
    InvalidStrip { index: usize, count: usize },

    /// Group index out of range.
    #[error("Group {index} out of range (have {count})")]
    InvalidGroup { index: usize, count: usize },

    /// Channel layout could not be used.
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    /// Recorder could not produce a loop.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Audio input error.
    #[error("Audio input error: {0}")]
    AudioInput(String),

    /// Core error.
    #[error(transparent)]
    Core(#[from] stripline_core::Error),

    /// Failed to enumerate devices.
    #[cfg(feature = "device")]
    #[error("Failed to enumerate audio devices")]
    DevicesError(#[from] cpal::DevicesError),

    /// Failed to get device config.
    #[cfg(feature = "device")]
    #[error("Failed to get audio device config")]
    DeviceConfigError(#[from] cpal::DefaultStreamConfigError),

    /// Failed to build stream.
    #[cfg(feature = "device")]
    #[error("Failed to build audio stream")]
    BuildStreamError(#[from] cpal::BuildStreamError),

    /// Failed to play stream.
    #[cfg(feature = "device")]
    #[error("Failed to play audio stream")]
    PlayStreamError(#[from] cpal::PlayStreamError),
}

/// Why a capture from the continuous recorder failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// Not enough audio has been recorded yet to cover the loop plus its pre-roll.
    #[error("Insufficient history: need {needed} samples, have {available}")]
    InsufficientHistory { needed: usize, available: usize },

    /// The requested loop would not fit in the recorder at all.
    #[error("Capture of {needed} samples exceeds recorder capacity of {capacity}")]
    ExceedsCapacity { needed: usize, capacity: usize },

    /// Zero-length loop requested.
    #[error("Capture length is zero")]
    Empty,

    /// The destination buffer is still referenced elsewhere and cannot be filled in place.
    #[error("Capture destination is shared")]
    DestinationShared,
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
