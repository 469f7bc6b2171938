use std::f32::consts::FRAC_PI_2;

// -------------------------------------------------------------------------------------------------

/// Pan law used to spread grains across the stereo field.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
pub enum PanLaw {
    /// `left = cos(pan * PI/2)`, `right = sin(pan * PI/2)`: constant perceived loudness.
    #[default]
    EqualPower,
    /// `left = 1 - pan`, `right = pan`.
    Linear,
}

impl PanLaw {
    /// Left and right gains for a pan position in `[0, 1]`.
    #[inline]
    pub fn gains(&self, pan: f32) -> (f32, f32) {
        let pan = pan.clamp(0.0, 1.0);
        match self {
            Self::EqualPower => {
                let angle = pan * FRAC_PI_2;
                (angle.cos(), angle.sin())
            }
            Self::Linear => (1.0 - pan, pan),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Crossfade law used to blend dry and wet signals.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
pub enum MixLaw {
    /// `dry = 1 - mix`, `wet = mix`.
    #[default]
    Linear,
    /// `dry = cos(mix * PI/2)`, `wet = sin(mix * PI/2)`.
    EqualPower,
}

impl MixLaw {
    /// Dry and wet gains for a mix amount in `[0, 1]`.
    #[inline]
    pub fn gains(&self, mix: f32) -> (f32, f32) {
        let mix = mix.clamp(0.0, 1.0);
        match self {
            Self::Linear => (1.0 - mix, mix),
            Self::EqualPower => {
                let angle = mix * FRAC_PI_2;
                (angle.cos(), angle.sin())
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Feeds the summed grain output back into the delay buffer.
///
/// The feedback amount in `[0, 1]` maps to gains below 1. Above
/// [`SATURATION_THRESHOLD`](Self::SATURATION_THRESHOLD) the fed back signal gets soft saturated
/// with `tanh`, which keeps long feedback chains bounded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedbackPath {
    gain: f32,
    sample: f32,
}

impl FeedbackPath {
    /// Gain at a feedback amount of 1.
    pub const MAX_GAIN: f32 = 0.95;
    /// Gains above this threshold saturate.
    pub const SATURATION_THRESHOLD: f32 = 0.5;

    pub const fn new() -> Self {
        Self {
            gain: 0.0,
            sample: 0.0,
        }
    }

    /// Current feedback gain.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// True when the fed back signal gets saturated.
    #[inline]
    pub fn is_saturating(&self) -> bool {
        self.gain > Self::SATURATION_THRESHOLD
    }

    /// Set the feedback amount in `[0, 1]`.
    pub fn set_amount(&mut self, amount: f32) {
        self.gain = amount.clamp(0.0, 1.0) * Self::MAX_GAIN;
    }

    /// The sample which should be added to the next delay buffer input.
    #[inline]
    pub fn sample(&self) -> f32 {
        self.sample
    }

    /// Calculate the next feedback sample from a stereo grain output frame.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> f32 {
        let feedback = (left + right) * 0.5 * self.gain;
        self.sample = if self.is_saturating() {
            feedback.tanh()
        } else {
            feedback
        };
        self.sample
    }

    /// Clear the pending feedback sample.
    pub fn reset(&mut self) {
        self.sample = 0.0;
    }
}

// -------------------------------------------------------------------------------------------------
