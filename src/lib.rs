//! # Stripline - grid-triggered sample performance engine
//!
//! Several independent strips each play a sample addressed by grid columns.
//! Presses trigger playback quantized to a musical clock, pairs of presses
//! carve out inner loops, and an always-on recorder turns the last few bars
//! of live input into a seamless loop on any strip.
//!
//! ## Architecture
//!
//! Stripline is an umbrella crate that coordinates:
//! - **stripline-core** - Musical clock, quantization grid, lock-free parameters, config
//! - **stripline-dsp** - Resampler, crossfade curves, DC blocker, peak meter
//! - **stripline-sampler** - Strips, continuous recorder, mute groups, live input
//!
//! The [`Engine`] is the control side. Its [`EngineState`] is handed to the
//! audio context, which calls [`EngineState::process`] once per block.
//!
//! ## Quick Start
//!
//! ```
//! use stripline::{ControlSurface, Engine, HostTransport, SampleBuffer};
//!
//! let engine = Engine::builder().sample_rate(48000.0).build().unwrap();
//! let mut state = engine.take_processor().unwrap();
//!
//! let data: Vec<f32> = (0..96_000).map(|i| (i as f32 * 0.02).sin() * 0.5).collect();
//! engine.load_buffer(0, SampleBuffer::new(vec![data], 48000.0).unwrap()).unwrap();
//!
//! // Grid press on strip 0, column 4: fires on the next grid boundary.
//! let mut grid = ControlSurface::for_engine(&engine);
//! grid.press(&engine, 0, 4).unwrap();
//!
//! let (mut left, mut right) = (vec![0.0f32; 512], vec![0.0f32; 512]);
//! let host = HostTransport::host(true, 0.0, Some(120.0));
//! state.process(&host, &[], &mut [&mut left[..], &mut right[..]]);
//! assert!(engine.leds()[0].playing);
//! ```
//!
//! ## Feature Flags
//!
//! - `device` - CPAL output stream and live input via [`device::run`]

pub use stripline_core as core;
pub use stripline_dsp as dsp;
pub use stripline_sampler as sampler;

pub use stripline_core::{
    ClockMode, ClockSnapshot, EngineConfig, HostTransport, MusicalClock, QuantizeDivision,
};
pub use stripline_dsp::{CrossfadeCurve, Quality, Resampler};
pub use stripline_sampler::{
    CaptureStatus, PlayDirection, PlayMode, SampleBuffer, StripHandle, StripLeds, StripStatus,
};

mod error;
pub use error::{Error, Result};

mod builder;
pub use builder::EngineBuilder;

mod engine;
pub use engine::{Engine, EngineState};

mod control;
pub use control::{ControlSurface, GridAction};

#[cfg(feature = "device")]
pub mod device;

pub mod prelude {
    pub use crate::{
        CaptureStatus, ControlSurface, Engine, EngineState, GridAction, HostTransport, PlayMode,
        QuantizeDivision, Quality, SampleBuffer,
    };
}
