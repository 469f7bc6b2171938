use crate::utils::pitch::semitones_to_rate;

use super::GrainWindow;

// -------------------------------------------------------------------------------------------------

/// Start properties of a new grain voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainStart {
    /// Fractional delay in samples behind the delay buffer's write head.
    pub read_position: f32,
    /// Pitch offset in semitones. 0 plays in unison.
    pub pitch_semitones: i32,
    /// Stereo position in `[0, 1]`: 0 = left, 0.5 = center, 1 = right.
    pub pan: f32,
    /// Grain length in samples. Zero lengths are played as one sample long grains.
    pub length_samples: u32,
    /// Reverse grains move further into the past, forward grains towards the write head.
    pub reverse: bool,
}

impl Default for GrainStart {
    fn default() -> Self {
        Self {
            read_position: 0.0,
            pitch_semitones: 0,
            pan: 0.5,
            length_samples: 1,
            reverse: false,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A single, possibly playing grain in a [`GrainPool`](super::GrainPool).
///
/// Voices are either idle or fully initialized. All properties except the read and window
/// positions are fixed when the voice starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainVoice {
    active: bool,
    read_position: f32,
    window_position: f64,
    window_increment: f64,
    playback_rate: f32,
    pan: f32,
    length_samples: u32,
    pitch_semitones: i32,
    reverse: bool,
}

impl Default for GrainVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl GrainVoice {
    /// Create a new, idle voice.
    pub const fn new() -> Self {
        Self {
            active: false,
            read_position: 0.0,
            window_position: 0.0,
            window_increment: 0.0,
            playback_rate: 1.0,
            pan: 0.5,
            length_samples: 1,
            pitch_semitones: 0,
            reverse: false,
        }
    }

    /// Start playing a new grain, replacing whatever this voice played before.
    pub fn start(&mut self, start: &GrainStart) {
        let length_samples = start.length_samples.max(1);
        *self = Self {
            active: true,
            read_position: start.read_position.max(0.0),
            window_position: 0.0,
            window_increment: 1.0 / length_samples as f64,
            playback_rate: semitones_to_rate(start.pitch_semitones as f32),
            pan: start.pan.clamp(0.0, 1.0),
            length_samples,
            pitch_semitones: start.pitch_semitones,
            reverse: start.reverse,
        };
    }

    /// Retire the voice.
    pub fn stop(&mut self) {
        self.active = false;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current fractional delay in samples behind the write head.
    #[inline]
    pub fn read_position(&self) -> f32 {
        self.read_position
    }

    /// Progress through the grain's window in `[0, 1)`.
    #[inline]
    pub fn window_position(&self) -> f32 {
        self.window_position as f32
    }

    #[inline]
    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    #[inline]
    pub fn pan(&self) -> f32 {
        self.pan
    }

    #[inline]
    pub fn length_samples(&self) -> u32 {
        self.length_samples
    }

    #[inline]
    pub fn pitch_semitones(&self) -> i32 {
        self.pitch_semitones
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Apply the window envelope to the given delay buffer sample, which got read at the
    /// voice's current read position, and move the voice by one sample.
    ///
    /// The voice retires when its window completed or when its read position left the
    /// `[0, buffer_capacity)` range.
    #[inline]
    pub fn advance(
        &mut self,
        buffer_sample: f32,
        window: GrainWindow,
        window_shape: f32,
        buffer_capacity: f32,
    ) -> f32 {
        if !self.active {
            return 0.0;
        }
        let envelope = window.sample(self.window_position as f32, window_shape);
        let output = buffer_sample * envelope;

        if self.reverse {
            self.read_position += self.playback_rate;
        } else {
            self.read_position -= self.playback_rate;
        }
        self.window_position += self.window_increment;

        if self.window_position >= 1.0
            || self.read_position < 0.0
            || self.read_position >= buffer_capacity
        {
            self.active = false;
        }
        output
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CAPACITY: f32 = 1_048_576.0;

    fn advance_until_idle(voice: &mut GrainVoice) -> usize {
        let mut count = 0;
        while voice.is_active() {
            let _ = voice.advance(1.0, GrainWindow::Hann, 0.0, CAPACITY);
            count += 1;
            assert!(count < 10_000_000, "voice never retired");
        }
        count
    }

    #[test]
    fn idle() {
        let mut voice = GrainVoice::new();
        assert!(!voice.is_active());
        assert_eq!(voice.advance(1.0, GrainWindow::Hann, 0.0, CAPACITY), 0.0);
        assert!(!voice.is_active());
    }

    #[test]
    fn self_termination() {
        for length in [1, 2, 3, 7, 100, 4800, 24000] {
            let mut voice = GrainVoice::new();
            voice.start(&GrainStart {
                read_position: 500_000.0,
                length_samples: length,
                ..GrainStart::default()
            });
            let played = advance_until_idle(&mut voice);
            assert!(
                played == length as usize || played == length as usize + 1,
                "grain with length {length} played {played} samples"
            );
        }
    }

    #[test]
    fn zero_length() {
        let mut voice = GrainVoice::new();
        voice.start(&GrainStart {
            read_position: 100.0,
            length_samples: 0,
            ..GrainStart::default()
        });
        assert_eq!(voice.length_samples(), 1);
        assert_eq!(advance_until_idle(&mut voice), 1);
    }

    #[test]
    fn read_direction() {
        let mut voice = GrainVoice::new();
        voice.start(&GrainStart {
            read_position: 100.0,
            pitch_semitones: 12,
            length_samples: 1000,
            ..GrainStart::default()
        });
        assert_eq!(voice.playback_rate(), 2.0);
        let _ = voice.advance(1.0, GrainWindow::Hann, 0.0, CAPACITY);
        assert_eq!(voice.read_position(), 98.0);

        let mut voice = GrainVoice::new();
        voice.start(&GrainStart {
            read_position: 100.0,
            length_samples: 1000,
            reverse: true,
            ..GrainStart::default()
        });
        let _ = voice.advance(1.0, GrainWindow::Hann, 0.0, CAPACITY);
        assert_eq!(voice.read_position(), 101.0);
    }

    #[test]
    fn retires_outside_buffer() {
        // forward grains reaching the write head
        let mut voice = GrainVoice::new();
        voice.start(&GrainStart {
            read_position: 10.0,
            length_samples: 1000,
            ..GrainStart::default()
        });
        assert_eq!(advance_until_idle(&mut voice), 11);

        // reverse grains reaching the end of the buffer
        let mut voice = GrainVoice::new();
        voice.start(&GrainStart {
            read_position: 90.0,
            length_samples: 1000,
            reverse: true,
            ..GrainStart::default()
        });
        while voice.is_active() {
            let _ = voice.advance(1.0, GrainWindow::Hann, 0.0, 100.0);
        }
        assert_eq!(voice.read_position(), 100.0);
    }

    #[test]
    fn envelope() {
        let mut voice = GrainVoice::new();
        voice.start(&GrainStart {
            read_position: 1000.0,
            length_samples: 4,
            ..GrainStart::default()
        });
        let output = (0..4)
            .map(|_| voice.advance(1.0, GrainWindow::Tukey, 1.0, CAPACITY))
            .collect::<Vec<_>>();
        assert_eq!(output[0], 0.0);
        assert!((output[1] - 0.5).abs() < 1e-5);
        assert!((output[2] - 1.0).abs() < 1e-5);
        assert!((output[3] - 0.5).abs() < 1e-5);
        assert!(!voice.is_active());
    }
}
