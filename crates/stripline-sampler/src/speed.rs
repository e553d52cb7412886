//! Playback direction, speed and the playhead speed grid.

/// Lower bound on strip speed magnitude.
pub const MIN_SPEED: f32 = 0.01;
/// Upper bound on strip speed magnitude.
pub const MAX_SPEED: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayDirection {
    #[default]
    Forward,
    Reverse,
}

impl PlayDirection {
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward)
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, Self::Reverse)
    }

    /// Opposite direction when `reversed` is set.
    pub fn flipped_if(self, reversed: bool) -> Self {
        match (self, reversed) {
            (d, false) => d,
            (Self::Forward, true) => Self::Reverse,
            (Self::Reverse, true) => Self::Forward,
        }
    }

    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

/// Direction plus speed magnitude for one strip.
#[derive(Debug, Clone, Copy)]
pub struct Varispeed {
    pub direction: PlayDirection,
    /// 1.0 = normal, 0.5 = half, 2.0 = double. A negative value flips direction.
    pub speed: f32,
}

impl Default for Varispeed {
    fn default() -> Self {
        Self {
            direction: PlayDirection::Forward,
            speed: 1.0,
        }
    }
}

impl Varispeed {
    pub fn new(speed: f32, direction: PlayDirection) -> Self {
        Self { direction, speed }
    }

    /// Direction after applying the sign of `speed`.
    pub fn resolved_direction(&self) -> PlayDirection {
        self.direction.flipped_if(self.speed < 0.0)
    }

    /// Always positive, within [`MIN_SPEED`, `MAX_SPEED`].
    pub fn effective_speed(&self) -> f32 {
        if self.speed.is_nan() {
            return 1.0;
        }
        self.speed.abs().clamp(MIN_SPEED, MAX_SPEED)
    }

    /// Negative for reverse.
    pub fn signed_speed(&self) -> f32 {
        self.effective_speed() * self.resolved_direction().sign() as f32
    }
}

/// Pitch shift in semitones as a playback ratio.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f64 {
    2f64.powf(semitones as f64 / 12.0)
}

/// Musical speed ratios selectable from a row of 16 columns.
pub const PLAYHEAD_SPEED_RATIOS: [f32; 16] = [
    0.125,
    1.0 / 6.0,
    0.25,
    1.0 / 3.0,
    0.5,
    2.0 / 3.0,
    0.75,
    0.875,
    1.0,
    1.125,
    1.25,
    4.0 / 3.0,
    1.5,
    2.0,
    3.0,
    4.0,
];

pub const PLAYHEAD_SPEED_LABELS: [&str; 16] = [
    "1/8", "1/6", "1/4", "1/3", "1/2", "2/3", "3/4", "7/8", "1", "9/8", "5/4", "4/3", "3/2", "2",
    "3", "4",
];

pub fn nearest_speed_index(ratio: f32) -> usize {
    let mut best = f32::MAX;
    let mut best_index = 0;
    for (i, &r) in PLAYHEAD_SPEED_RATIOS.iter().enumerate() {
        let diff = (ratio - r).abs();
        if diff < best {
            best = diff;
            best_index = i;
        }
    }
    best_index
}

pub fn speed_ratio_from_column(column: usize) -> f32 {
    PLAYHEAD_SPEED_RATIOS[column.min(PLAYHEAD_SPEED_RATIOS.len() - 1)]
}

pub fn quantize_speed_ratio(ratio: f32) -> f32 {
    PLAYHEAD_SPEED_RATIOS[nearest_speed_index(ratio)]
}

pub fn speed_label(ratio: f32) -> &'static str {
    PLAYHEAD_SPEED_LABELS[nearest_speed_index(ratio)]
}

/// Beats covered by a recording of `bars` bars, snapped to 4/8/16/32.
pub fn normalize_recording_bars(bars: u32) -> f32 {
    match bars {
        0 | 1 => 4.0,
        2 => 8.0,
        3 | 4 => 16.0,
        _ => 32.0,
    }
}

/// How many beats one pass of a `bars`-bar loop lasts at `ratio` speed.
pub fn beats_per_loop_from_ratio(ratio: f32, bars: u32) -> f32 {
    normalize_recording_bars(bars) / ratio.max(PLAYHEAD_SPEED_RATIOS[0])
}

/// Inverse of [`beats_per_loop_from_ratio`]; 1.0 for unusable input.
pub fn ratio_from_beats_per_loop(beats_per_loop: f32, bars: u32) -> f32 {
    if !(beats_per_loop > 0.0) || !beats_per_loop.is_finite() {
        return 1.0;
    }
    normalize_recording_bars(bars) / beats_per_loop
}
