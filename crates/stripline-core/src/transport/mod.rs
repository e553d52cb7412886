//! Musical time: host transport snapshots, the block clock, and the trigger grid.

mod clock;
mod host;
mod quantize;

pub use clock::{ClockSnapshot, MusicalClock, SharedClockState, MAX_TEMPO, MIN_TEMPO};
pub use host::{ClockMode, HostTransport};
pub use quantize::{next_boundary, QuantizeDivision, QUANTIZE_CHOICES};
