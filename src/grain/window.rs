//! Grain amplitude windows.

use std::{f32::consts::PI, sync::LazyLock};

// -------------------------------------------------------------------------------------------------

/// Smallest Tukey alpha. Smaller values would divide by zero in the taper.
const MIN_TUKEY_ALPHA: f32 = 0.001;

/// Largest window position: positions are clamped into `[0, 1)`.
const MAX_WINDOW_POSITION: f32 = 1.0 - f32::EPSILON;

// -------------------------------------------------------------------------------------------------

/// Envelope shapes for grains, evaluated at a relative position within the grain.
///
/// Windows are pure functions of `(position, shape)`, so a single window can be shared by all
/// voices of a pool.
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
pub enum GrainWindow {
    /// Raised cosine, looked up from a precomputed table. Ignores the shape parameter.
    #[default]
    Hann,
    /// Tapered cosine: rises and falls with a cosine over `alpha / 2` of the grain each and stays
    /// at full gain in between. Shape is alpha in `(0, 1]`: small values give short, clicky
    /// crossfades, 1 is a Hann window.
    Tukey,
}

impl GrainWindow {
    /// Evaluate the window at `position`, clamped into `[0, 1)`. Returns a gain in `[0, 1]`.
    #[inline]
    pub fn sample(&self, position: f32, shape: f32) -> f32 {
        let position = position.clamp(0.0, MAX_WINDOW_POSITION);
        match self {
            Self::Hann => HANN_WINDOW_TABLE.sample(position),
            Self::Tukey => tukey(position, shape),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Closed form Hann window.
#[inline]
pub fn hann(position: f32) -> f32 {
    0.5 * (1.0 - (2.0 * PI * position).cos())
}

/// Closed form Tukey window with the given alpha.
#[inline]
pub fn tukey(position: f32, alpha: f32) -> f32 {
    let alpha = alpha.clamp(MIN_TUKEY_ALPHA, 1.0);
    let half_alpha = alpha / 2.0;
    let gain = if position < half_alpha {
        0.5 * (1.0 - (2.0 * PI * position / alpha).cos())
    } else if position <= 1.0 - half_alpha {
        1.0
    } else {
        0.5 * (1.0 - (2.0 * PI * (1.0 - position) / alpha).cos())
    };
    gain.clamp(0.0, 1.0)
}

// -------------------------------------------------------------------------------------------------

/// Precomputed window lookup table with `N` points over `[0, 1]`, read with linear interpolation.
pub struct WindowTable<const N: usize> {
    table: [f32; N],
}

impl<const N: usize> WindowTable<N> {
    const _VERIFY_N: () = assert!(N >= 2, "Window tables need at least two points");

    /// Precompute a table from the given window function.
    pub fn new(window: impl Fn(f32) -> f32) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::_VERIFY_N;
        let mut table = [0.0; N];
        for (i, value) in table.iter_mut().enumerate() {
            let position = i as f32 / (N - 1) as f32;
            *value = window(position);
        }
        Self { table }
    }

    /// Evaluate the table at `position` in `[0, 1]`.
    #[inline]
    pub fn sample(&self, position: f32) -> f32 {
        debug_assert!((0.0..=1.0).contains(&position));
        let index_float = position * (N - 1) as f32;
        let index = index_float as usize;
        if index >= N - 1 {
            return self.table[N - 1];
        }
        let fraction = index_float - index as f32;
        self.table[index] + (self.table[index + 1] - self.table[index]) * fraction
    }
}

/// Size of the shared Hann window table.
pub const HANN_WINDOW_TABLE_SIZE: usize = 4096;

/// Static, shared Hann window lookup table.
pub(crate) static HANN_WINDOW_TABLE: LazyLock<WindowTable<HANN_WINDOW_TABLE_SIZE>> =
    LazyLock::new(|| WindowTable::new(hann));

// -------------------------------------------------------------------------------------------------
