use rand::Rng;

// -------------------------------------------------------------------------------------------------

/// Jitter amounts below this threshold schedule grains at fixed intervals.
const JITTER_THRESHOLD: f32 = 0.01;

// -------------------------------------------------------------------------------------------------

/// Decides when new grains get spawned.
///
/// The scheduler counts samples since the last spawned grain and fires when the count reaches
/// the grain interval, optionally perturbed by random, multiplicative jitter. The counter
/// restarts on every fire.
#[derive(Debug, Clone, PartialEq)]
pub struct GrainScheduler {
    samples_since_last_grain: u32,
    next_grain_interval: u32,
}

impl Default for GrainScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl GrainScheduler {
    /// Create a new scheduler which fires on every sample until an interval got set.
    pub const fn new() -> Self {
        Self {
            samples_since_last_grain: 0,
            next_grain_interval: 1,
        }
    }

    /// Grain interval in samples for the given delay time, sample rate and density multiplier.
    ///
    /// Densities below 1 get treated as 1. The interval is at least one sample.
    pub fn interval_from_delay_time(delay_time_ms: f32, sample_rate: u32, density: f32) -> u32 {
        let delay_samples = delay_time_ms as f64 * sample_rate as f64 / 1000.0;
        (delay_samples / density.max(1.0) as f64).max(1.0) as u32
    }

    /// Density multiplier for the given character amount in `[0, 1]`: 1 to 4.
    pub fn density_from_character(character: f32) -> f32 {
        1.0 + character.clamp(0.0, 1.0) * 3.0
    }

    #[inline]
    pub fn next_grain_interval(&self) -> u32 {
        self.next_grain_interval
    }

    #[inline]
    pub fn samples_since_last_grain(&self) -> u32 {
        self.samples_since_last_grain
    }

    /// Set a new grain interval in samples. The interval is at least one sample.
    pub fn set_interval(&mut self, interval: u32) {
        self.next_grain_interval = interval.max(1);
    }

    /// Restart counting, without changing the interval.
    pub fn reset(&mut self) {
        self.samples_since_last_grain = 0;
    }

    /// Move by one sample. Returns true when a new grain should be spawned.
    ///
    /// With `jitter` above 0.01, the interval of this sample gets scaled by a random factor in
    /// `1 +- jitter / 2`.
    #[inline]
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, jitter: f32) -> bool {
        self.samples_since_last_grain = self.samples_since_last_grain.saturating_add(1);

        let mut current_interval = self.next_grain_interval;
        if jitter > JITTER_THRESHOLD {
            let factor = 1.0 + (rng.random::<f32>() - 0.5) * jitter;
            current_interval = ((self.next_grain_interval as f32 * factor) as u32).max(1);
        }

        if self.samples_since_last_grain >= current_interval {
            self.samples_since_last_grain = 0;
            true
        } else {
            false
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;

    fn fire_positions(scheduler: &mut GrainScheduler, jitter: f32, samples: usize) -> Vec<usize> {
        let mut rng = SmallRng::seed_from_u64(0x6a1);
        (0..samples)
            .filter(|_| scheduler.tick(&mut rng, jitter))
            .collect()
    }

    #[test]
    fn intervals() {
        assert_eq!(GrainScheduler::interval_from_delay_time(500.0, 48000, 1.0), 24000);
        assert_eq!(GrainScheduler::interval_from_delay_time(500.0, 48000, 4.0), 6000);
        assert_eq!(GrainScheduler::interval_from_delay_time(50.0, 44100, 2.5), 882);
        assert_eq!(GrainScheduler::interval_from_delay_time(0.0, 48000, 1.0), 1);
        assert_eq!(GrainScheduler::interval_from_delay_time(100.0, 1000, 0.0), 100);
        assert_eq!(GrainScheduler::density_from_character(0.0), 1.0);
        assert_eq!(GrainScheduler::density_from_character(1.0), 4.0);
        assert_eq!(GrainScheduler::density_from_character(2.0), 4.0);
    }

    #[test]
    fn deterministic_without_jitter() {
        let mut scheduler = GrainScheduler::new();
        scheduler.set_interval(100);
        let positions = fire_positions(&mut scheduler, 0.0, 1000);
        assert_eq!(positions, (1..=10).map(|i| i * 100 - 1).collect::<Vec<_>>());

        // tiny jitter amounts are ignored
        let mut scheduler = GrainScheduler::new();
        scheduler.set_interval(100);
        assert_eq!(fire_positions(&mut scheduler, 0.005, 1000), positions);
    }

    #[test]
    fn minimum_interval() {
        let mut scheduler = GrainScheduler::new();
        scheduler.set_interval(0);
        assert_eq!(scheduler.next_grain_interval(), 1);
        assert_eq!(fire_positions(&mut scheduler, 0.0, 10).len(), 10);
        // jitter never shrinks the interval below one sample
        assert_eq!(fire_positions(&mut scheduler, 1.0, 10).len(), 10);
    }

    #[test]
    fn jittered_intervals() {
        let mut scheduler = GrainScheduler::new();
        scheduler.set_interval(1000);
        let positions = fire_positions(&mut scheduler, 1.0, 100_000);
        assert!(positions.len() > 50);
        let mut spacings = positions.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();
        assert!(spacings.iter().all(|s| (500..=1500).contains(s)));
        // jitter must actually vary the spacing
        spacings.dedup();
        assert!(spacings.len() > 1);
    }

    #[test]
    fn reset() {
        let mut scheduler = GrainScheduler::new();
        scheduler.set_interval(10);
        let _ = fire_positions(&mut scheduler, 0.0, 5);
        assert_eq!(scheduler.samples_since_last_grain(), 5);
        scheduler.reset();
        assert_eq!(scheduler.samples_since_last_grain(), 0);
        assert_eq!(scheduler.next_grain_interval(), 10);
    }
}
