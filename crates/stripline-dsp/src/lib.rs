//! RT-safe DSP building blocks: fractional-position resampling, crossfade
//! curves and gain ramps, DC blocking, and peak metering. Nothing here
//! allocates after construction.

mod crossfade;
pub use crossfade::{crossfade_progress, equal_power, raised_cosine, CrossfadeCurve};

mod ramp;
pub use ramp::FadeRamp;

mod resampler;
pub use resampler::{Quality, Resampler};

mod dc_blocker;
pub use dc_blocker::{DcBlocker, DC_BLOCKER_CUTOFF_HZ};

mod meter;
pub use meter::PeakMeter;
