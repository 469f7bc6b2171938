//! Pitch helpers: semitone to playback rate conversion, discrete pitch randomization and
//! musical scale quantization.

use rand::Rng;

// -------------------------------------------------------------------------------------------------

/// Intervals in semitones which randomly pitched grains get picked from: octaves and fifths.
pub const PITCH_SHIFT_INTERVALS: [i32; 4] = [-12, -7, 7, 12];

/// Chaos amounts below this threshold never shift the pitch.
const PITCH_SHIFT_CHAOS_THRESHOLD: f32 = 0.01;

// -------------------------------------------------------------------------------------------------

/// Convert a pitch offset in semitones to a playback rate: `2^(semitones/12)`.
#[inline]
pub fn semitones_to_rate(semitones: f32) -> f32 {
    (semitones / 12.0).exp2()
}

// -------------------------------------------------------------------------------------------------

/// Randomly select a pitch shift for a new grain in semitones.
///
/// With probability `1 - chaos` the grain plays in unison (0), else one of the
/// [`PITCH_SHIFT_INTERVALS`] gets picked uniformly.
pub fn select_pitch_shift<R: Rng + ?Sized>(rng: &mut R, chaos: f32) -> i32 {
    if chaos < PITCH_SHIFT_CHAOS_THRESHOLD {
        return 0;
    }
    if rng.random::<f32>() >= chaos {
        return 0;
    }
    PITCH_SHIFT_INTERVALS[rng.random_range(0..PITCH_SHIFT_INTERVALS.len())]
}

// -------------------------------------------------------------------------------------------------

/// Musical scales for pitch quantization.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::VariantNames,
)]
pub enum PitchScale {
    #[default]
    Chromatic,
    Major,
    Minor,
    Pentatonic,
    Blues,
}

impl PitchScale {
    /// Scale degrees in semitones, relative to the root note.
    pub const fn intervals(&self) -> &'static [i32] {
        match self {
            Self::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Self::Pentatonic => &[0, 2, 4, 7, 9],
            Self::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Root note of a [`PitchScale`].
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::VariantNames,
)]
#[repr(u8)]
pub enum RootNote {
    #[default]
    C = 0,
    #[strum(serialize = "C#")]
    CSharp,
    D,
    #[strum(serialize = "D#")]
    DSharp,
    E,
    F,
    #[strum(serialize = "F#")]
    FSharp,
    G,
    #[strum(serialize = "G#")]
    GSharp,
    A,
    #[strum(serialize = "A#")]
    ASharp,
    B,
}

impl RootNote {
    /// Offset in semitones from C.
    pub const fn semitones(&self) -> i32 {
        *self as i32
    }
}

// -------------------------------------------------------------------------------------------------

/// Quantize a pitch offset in semitones to the nearest degree of the given scale.
///
/// The pitch is rounded, split into octave and semitone, snapped to the nearest scale degree
/// (lower degree wins on ties) and transposed by the root note. The result is limited to one
/// octave up or down.
pub fn quantize_pitch_to_scale(semitones: f32, scale: PitchScale, root: RootNote) -> i32 {
    let pitch = semitones.round() as i32;
    let octave = pitch.div_euclid(12);
    let semitone = pitch.rem_euclid(12);

    let mut nearest = 0;
    let mut min_distance = i32::MAX;
    for &degree in scale.intervals() {
        let distance = (semitone - degree).abs();
        if distance < min_distance {
            min_distance = distance;
            nearest = degree;
        }
    }
    (octave * 12 + nearest + root.semitones()).clamp(-12, 12)
}

// -------------------------------------------------------------------------------------------------
