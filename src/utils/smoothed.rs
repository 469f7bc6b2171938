use std::fmt::Debug;

// -------------------------------------------------------------------------------------------------

/// Provides smooth transitions between a current and target f32 value.
/// Smoothing needs to be applied to avoid clicks in e.g. dry/wet mix or gain changes.
pub trait SmoothedValue: Debug {
    /// Access to the current, possibly ramped value.
    #[must_use]
    fn current(&self) -> f32;
    /// Access to the target value.
    #[must_use]
    fn target(&self) -> f32;

    /// Ramp, if needed, and get the current ramped value, else returns the target value.
    #[must_use]
    fn next(&mut self) -> f32 {
        if self.need_ramp() {
            self.ramp();
            self.current()
        } else {
            self.target()
        }
    }

    /// Test if ramping is necessary. When ramping is not necessary, the target value can be
    /// applied to whole blocks without calling `next` or `ramp`.
    #[must_use]
    fn need_ramp(&self) -> bool;
    /// Move current to target value, when ramping is necessary, else does nothing.
    fn ramp(&mut self);

    /// Set current and target to the same value.
    fn init(&mut self, value: f32);
    /// Set a new target value and ramp current, when current is different from the target.
    fn set_target(&mut self, target: f32);

    /// Update sample rate of the smoothed value. Smoothed values are expected to be called
    /// once per audio frame and the ramping time scales with the sample rate.
    fn set_sample_rate(&mut self, sample_rate: u32);
}

// -------------------------------------------------------------------------------------------------

/// One-pole exponential smoothed value, approaching its target within a fixed time constant.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothedValue {
    current: f32,
    target: f32,
    time_constant: f32,
    coefficient: f32,
}

impl ExponentialSmoothedValue {
    /// Default time constant in seconds.
    pub const DEFAULT_TIME_CONSTANT: f32 = 0.02;

    /// Deviations below this threshold snap to the target.
    const EPSILON: f32 = 1.0e-5;

    pub fn new(value: f32, sample_rate: u32) -> Self {
        Self::with_time_constant(value, Self::DEFAULT_TIME_CONSTANT, sample_rate)
    }

    pub fn with_time_constant(value: f32, time_constant: f32, sample_rate: u32) -> Self {
        assert!(time_constant > 0.0, "Invalid time constant");
        assert!(sample_rate > 0, "Invalid sample rate");
        Self {
            current: value,
            target: value,
            time_constant,
            coefficient: Self::coefficient(time_constant, sample_rate),
        }
    }

    #[inline(always)]
    pub fn time_constant(&self) -> f32 {
        self.time_constant
    }

    fn coefficient(time_constant: f32, sample_rate: u32) -> f32 {
        1.0 - (-1.0 / (time_constant * sample_rate as f32)).exp()
    }
}

impl SmoothedValue for ExponentialSmoothedValue {
    #[inline(always)]
    fn current(&self) -> f32 {
        self.current
    }

    #[inline(always)]
    fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    fn need_ramp(&self) -> bool {
        self.current != self.target
    }

    #[inline]
    fn ramp(&mut self) {
        self.current += (self.target - self.current) * self.coefficient;
        if (self.target - self.current).abs() < Self::EPSILON {
            self.current = self.target;
        }
    }

    fn init(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    fn set_target(&mut self, target: f32) {
        self.target = target;
        if (self.target - self.current).abs() < Self::EPSILON {
            self.current = self.target;
        }
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        assert!(sample_rate > 0, "Invalid sample rate");
        self.coefficient = Self::coefficient(self.time_constant, sample_rate);
    }
}

impl Default for ExponentialSmoothedValue {
    fn default() -> Self {
        Self::new(0.0, 44100)
    }
}

// -------------------------------------------------------------------------------------------------
