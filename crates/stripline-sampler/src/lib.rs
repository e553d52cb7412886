//! Strips, the continuous recorder, mute groups and live input.
//!
//! # Features
//!
//! - **Strips**: column-addressed sample playback with quantized triggers,
//!   inner loops with a pre-roll seam crossfade, and seven play modes
//! - **Continuous recorder**: DC-blocked input history and click-free loop capture
//! - **Mute groups**: exclusive playback with shared volume and mute
//! - **Audio input**: lock-free bridge from an input device callback
//!
//! # Example
//!
//! ```
//! use stripline_sampler::{ContinuousRecorder, SampleBuffer};
//!
//! let mut recorder = ContinuousRecorder::new(2, 96_000, 48000.0);
//! let block = vec![0.25f32; 1024];
//! for _ in 0..40 {
//!     recorder.write(&[&block[..], &block[..]]);
//! }
//!
//! let (looped, report) = recorder.capture(24_000, 480).unwrap();
//! assert_eq!(looped.len(), 24_000);
//! assert!(report.pre_roll.end <= report.loop_region.start);
//! ```

pub mod error;
pub use error::{CaptureError, Error, Result};

mod buffer;
pub use buffer::{bake_crossfade, SampleBuffer};

mod wav;
pub use wav::{load_wav, write_wav};

pub mod speed;
pub use speed::{PlayDirection, Varispeed};

pub mod strip;
pub use strip::{PlayMode, Strip, StripHandle, StripLeds, StripStatus};

pub mod recorder;
pub use recorder::{
    loop_length_samples, should_blink_record_led, CaptureJob, CaptureReport, CaptureStatus,
    ContinuousRecorder, RecorderHandle,
};

mod group;
pub use group::{MuteGroups, MAX_GROUP_STRIPS};

pub mod audio_input;
pub use audio_input::{AudioInput, InputSender};
