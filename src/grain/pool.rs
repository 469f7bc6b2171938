use rand::Rng;

use crate::utils::{dsp::delay::DelayBuffer, pitch::select_pitch_shift};

use super::{GrainStart, GrainVoice, GrainWindow, PanLaw};

// -------------------------------------------------------------------------------------------------

/// Result of a voice allocation in a [`GrainPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceAllocation {
    /// An idle voice got found.
    Free(usize),
    /// All voices were busy and the voice at the given index got stolen.
    Stolen(usize),
}

impl VoiceAllocation {
    /// The allocated voice's index in the pool.
    pub fn index(&self) -> usize {
        match self {
            Self::Free(index) | Self::Stolen(index) => *index,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Grain position snapshot for visualizations.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GrainPosition {
    /// Read position relative to the delay buffer's capacity in `[0, 1]`.
    pub x: f32,
    /// Pitch in `[-1, 1]`: -1 is 7 or more semitones down, 1 is 7 or more semitones up.
    pub y: f32,
    /// Stereo position in `[0, 1]`.
    pub pan: f32,
}

// -------------------------------------------------------------------------------------------------

/// Control values a [`GrainPool`] uses to randomize newly spawned grains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainSpawnParameters {
    /// Grain length in milliseconds.
    pub grain_size_ms: f32,
    /// Base read position (delay behind the write head) in milliseconds.
    pub delay_time_ms: f32,
    /// Randomization amount in `[0, 1]` for read position, pitch and pan.
    pub chaos: f32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Largest valid read position in samples.
    pub max_read_position: f32,
}

impl GrainSpawnParameters {
    /// Grain length in samples: at least one sample.
    pub fn grain_length_samples(&self) -> u32 {
        let length = (self.grain_size_ms * self.sample_rate as f32 / 1000.0).round();
        (length as u32).max(1)
    }

    /// Create the start properties of a new randomized grain.
    pub fn randomize<R: Rng + ?Sized>(&self, rng: &mut R) -> GrainStart {
        let length_samples = self.grain_length_samples();

        let delay_samples = self.delay_time_ms * self.sample_rate as f32 / 1000.0;
        let jitter = (rng.random::<f32>() - 0.5) * self.chaos * 0.5;
        let read_position = (delay_samples * (1.0 + jitter)).clamp(1.0, self.max_read_position);

        let pitch_semitones = select_pitch_shift(rng, self.chaos);

        let pan = (0.5 + (rng.random::<f32>() - 0.5) * self.chaos).clamp(0.0, 1.0);

        GrainStart {
            read_position,
            pitch_semitones,
            pan,
            length_samples,
            reverse: false,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Fixed size pool of grain voices.
///
/// Voices get allocated with a linear scan for an idle voice. When all voices are busy, the
/// first voice gets stolen and restarted, which abruptly cuts off the grain it played. This may
/// click under heavy load: a smoother policy would crossfade or steal the voice which is closest
/// to completion.
#[derive(Debug, Clone)]
pub struct GrainPool<const POOL_SIZE: usize> {
    voices: [GrainVoice; POOL_SIZE],
}

impl<const POOL_SIZE: usize> Default for GrainPool<POOL_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const POOL_SIZE: usize> GrainPool<POOL_SIZE> {
    /// Voice which gets restarted when all voices are busy.
    pub const STOLEN_VOICE_INDEX: usize = 0;

    const _VERIFY_POOL_SIZE: () = assert!(POOL_SIZE > 0, "Need at least one grain voice");

    /// Create a new pool with idle voices.
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::_VERIFY_POOL_SIZE;
        Self {
            voices: [GrainVoice::new(); POOL_SIZE],
        }
    }

    /// Number of voices in the pool.
    pub const fn capacity(&self) -> usize {
        POOL_SIZE
    }

    /// Read-only access to all voices.
    pub fn voices(&self) -> &[GrainVoice] {
        &self.voices
    }

    /// Number of currently playing voices.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|voice| voice.is_active()).count()
    }

    /// Find an idle voice or pick the voice which gets stolen.
    pub fn find_free_voice(&self) -> VoiceAllocation {
        match self.voices.iter().position(|voice| !voice.is_active()) {
            Some(index) => VoiceAllocation::Free(index),
            None => VoiceAllocation::Stolen(Self::STOLEN_VOICE_INDEX),
        }
    }

    /// Start a grain with the given properties on a free or stolen voice.
    pub fn trigger(&mut self, start: &GrainStart) -> VoiceAllocation {
        let allocation = self.find_free_voice();
        self.voices[allocation.index()].start(start);
        allocation
    }

    /// Start a new grain with randomized properties on a free or stolen voice.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        parameters: &GrainSpawnParameters,
        rng: &mut R,
    ) -> VoiceAllocation {
        let start = parameters.randomize(rng);
        self.trigger(&start)
    }

    /// Stop all voices.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.stop();
        }
    }

    /// Advance all playing voices by one sample, reading from the given delay buffer, and return
    /// the panned sum of all voices.
    #[inline]
    pub fn process_sample(
        &mut self,
        buffer: &DelayBuffer<1>,
        window: GrainWindow,
        window_shape: f32,
        pan_law: PanLaw,
    ) -> [f32; 2] {
        let buffer_capacity = buffer.capacity() as f32;
        let mut output = [0.0; 2];
        for voice in self.voices.iter_mut().filter(|voice| voice.is_active()) {
            let [buffer_sample] = buffer.read(voice.read_position());
            let (left_gain, right_gain) = pan_law.gains(voice.pan());
            let sample = voice.advance(buffer_sample, window, window_shape, buffer_capacity);
            output[0] += sample * left_gain;
            output[1] += sample * right_gain;
        }
        output
    }

    /// Copy the positions of all playing grains into `positions` and return the number of
    /// written positions.
    pub fn grain_positions(&self, buffer_capacity: usize, positions: &mut [GrainPosition]) -> usize {
        let capacity = buffer_capacity.max(1) as f32;
        let mut count = 0;
        for (voice, position) in self
            .voices
            .iter()
            .filter(|voice| voice.is_active())
            .zip(positions.iter_mut())
        {
            *position = GrainPosition {
                x: (voice.read_position() / capacity).clamp(0.0, 1.0),
                y: (voice.pitch_semitones() as f32 / 7.0).clamp(-1.0, 1.0),
                pan: voice.pan(),
            };
            count += 1;
        }
        count
    }
}

// -------------------------------------------------------------------------------------------------
