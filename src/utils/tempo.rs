//! Tempo helpers to snap time parameters to musical note divisions.

use std::ops::RangeInclusive;

// -------------------------------------------------------------------------------------------------

/// Tempo used when the host does not provide one.
pub const DEFAULT_BPM: f64 = 120.0;
/// Valid tempo range for tempo synced delay times.
pub const BPM_RANGE: RangeInclusive<f64> = 20.0..=300.0;

// -------------------------------------------------------------------------------------------------

/// Musical note divisions in beats which tempo synced delay times snap to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter, strum::VariantNames,
)]
pub enum NoteDivision {
    #[strum(serialize = "1/16")]
    Sixteenth,
    #[strum(serialize = "1/8")]
    Eighth,
    #[strum(serialize = "1/4")]
    Quarter,
    #[strum(serialize = "1/2")]
    Half,
    #[strum(serialize = "1/1")]
    Whole,
}

impl NoteDivision {
    /// All divisions in snapping order. Earlier entries win on ties.
    pub const ALL: [NoteDivision; 5] = [
        Self::Sixteenth,
        Self::Eighth,
        Self::Quarter,
        Self::Half,
        Self::Whole,
    ];

    /// Length of the division in beats (quarter notes).
    pub const fn beats(&self) -> f64 {
        match self {
            Self::Sixteenth => 0.25,
            Self::Eighth => 0.5,
            Self::Quarter => 1.0,
            Self::Half => 2.0,
            Self::Whole => 4.0,
        }
    }

    /// Length of the division in milliseconds at the given tempo.
    pub fn duration_ms(&self, bpm: f64) -> f64 {
        self.beats() * 60_000.0 / bpm
    }
}

// -------------------------------------------------------------------------------------------------

/// Snap a delay time in milliseconds to the nearest [`NoteDivision`] at the given tempo, then
/// clamp it into `range`. The tempo gets clamped into [`BPM_RANGE`] and falls back to
/// [`DEFAULT_BPM`] when it's not a finite number.
pub fn quantize_delay_time_to_tempo(delay_ms: f32, bpm: f64, range: RangeInclusive<f32>) -> f32 {
    let bpm = if bpm.is_finite() {
        bpm.clamp(*BPM_RANGE.start(), *BPM_RANGE.end())
    } else {
        DEFAULT_BPM
    };
    let mut nearest_ms = NoteDivision::ALL[0].duration_ms(bpm);
    let mut min_distance = f64::MAX;
    for division in NoteDivision::ALL {
        let division_ms = division.duration_ms(bpm);
        let distance = (delay_ms as f64 - division_ms).abs();
        if distance < min_distance {
            min_distance = distance;
            nearest_ms = division_ms;
        }
    }
    (nearest_ms as f32).clamp(*range.start(), *range.end())
}

// -------------------------------------------------------------------------------------------------
