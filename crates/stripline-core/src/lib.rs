//! Real-time core for the Stripline sample-performance engine.
//!
//! # Primary API
//!
//! - [`MusicalClock`]: host-locked or free-running beat clock driving quantized triggers
//! - [`HostTransport`]: per-block transport snapshot supplied by the host
//! - [`QuantizeDivision`]: trigger grid (1..=32 subdivisions per whole note)
//! - [`EngineConfig`]: structural configuration validated at build time
//! - [`AtomicFloat`], [`AtomicDouble`], [`AtomicFlag`], [`AtomicColumnRange`]: lock-free parameters
//!
//! # Feature-gated APIs
//!
//! - `"device"`: [`AudioOutput`] CPAL output stream
//!
//! # Example
//!
//! ```
//! use stripline_core::{HostTransport, MusicalClock, QuantizeDivision};
//!
//! let mut clock = MusicalClock::new(48000.0, 120.0);
//! clock.update(&HostTransport::host(true, 3.9, Some(120.0)), 512);
//!
//! let target = clock.next_boundary(QuantizeDivision::new(4));
//! assert_eq!(target, 4.0);
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::EngineConfig;

pub(crate) mod lockfree;
pub use lockfree::{AtomicColumnRange, AtomicDouble, AtomicFlag, AtomicFloat};

mod smooth;
pub use smooth::SmoothedValue;

pub mod transport;
pub use transport::{
    next_boundary, ClockMode, ClockSnapshot, HostTransport, MusicalClock, QuantizeDivision,
    SharedClockState, MAX_TEMPO, MIN_TEMPO,
};

#[cfg(feature = "device")]
mod output;
#[cfg(feature = "device")]
pub use output::{AudioOutput, OutputConfig};

pub use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, AtomicU8, Ordering};
pub use std::sync::Arc;
