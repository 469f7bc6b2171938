use std::{any::Any, ops::RangeInclusive, sync::LazyLock};

use four_cc::FourCC;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    effect::{Effect, EffectMessage, EffectMessagePayload, EffectTime},
    grain::{
        FeedbackPath, GrainPool, GrainPosition, GrainScheduler, GrainStart, GrainVoice,
        GrainWindow, MixLaw, PanLaw, GRAIN_SIZE_RANGE, HANN_WINDOW_TABLE, MAX_DELAY_SECONDS,
    },
    parameter::{
        EnumParameter, FloatParameter, ParameterScaling, ParameterValueUpdate,
        SharedParameterDescriptor, SharedParameters,
    },
    utils::{
        self,
        buffer::InterleavedBufferMut,
        dsp::delay::DelayBuffer,
        pitch::{quantize_pitch_to_scale, PitchScale, RootNote},
        smoothed::{ExponentialSmoothedValue, SmoothedValue},
    },
    ClonableParameter, Error,
};

// -------------------------------------------------------------------------------------------------

/// Message type for `ScatterEffect`.
#[derive(Clone, Debug)]
pub enum ScatterEffectMessage {
    /// Silence the delay buffer and stop all playing grains.
    Reset,
}

impl EffectMessage for ScatterEffectMessage {
    fn effect_name(&self) -> &'static str {
        ScatterEffect::EFFECT_NAME
    }
    fn payload(&self) -> &dyn Any {
        self
    }
}

// -------------------------------------------------------------------------------------------------

const SCATTER_VOICE_COUNT: usize = 64;

/// Per block parameter snapshot.
#[derive(Debug, Clone, Copy)]
struct ScatterBlock {
    delay_samples: f32,
    grain_samples: u32,
    pitch_random: f32,
    pan_random: f32,
    scale: PitchScale,
    root_note: RootNote,
}

// -------------------------------------------------------------------------------------------------

/// A stereo granular delay which scatters pitched, panned and reversed grains.
///
/// Grains spawn at a fixed rate, derived from grain size and density, and start reading at the
/// delay time behind the write head. Grain pitches are random, quantized to a musical scale.
/// Half of all grains play in reverse.
pub struct ScatterEffect {
    sample_rate: u32,
    channel_count: usize,
    parameters: SharedParameters,
    buffer: DelayBuffer<1>,
    pool: GrainPool<SCATTER_VOICE_COUNT>,
    scheduler: GrainScheduler,
    feedback: FeedbackPath,
    mix: ExponentialSmoothedValue,
    mix_initialized: bool,
    mix_law: MixLaw,
    rng: SmallRng,
}

impl ScatterEffect {
    pub const EFFECT_NAME: &str = "ScatterEffect";
    pub const DELAY_TIME_ID: FourCC = FourCC(*b"dlay");
    pub const GRAIN_SIZE_ID: FourCC = FourCC(*b"grsz");
    pub const DENSITY_ID: FourCC = FourCC(*b"dens");
    pub const PITCH_RANDOM_ID: FourCC = FourCC(*b"ptch");
    pub const SCALE_ID: FourCC = FourCC(*b"scal");
    pub const ROOT_NOTE_ID: FourCC = FourCC(*b"root");
    pub const PAN_RANDOM_ID: FourCC = FourCC(*b"pan_");
    pub const FEEDBACK_ID: FourCC = FourCC(*b"fdbk");
    pub const MIX_ID: FourCC = FourCC(*b"mix_");

    /// Number of grain voices.
    pub const VOICE_COUNT: usize = SCATTER_VOICE_COUNT;

    /// Valid delay times in milliseconds.
    pub const DELAY_TIME_RANGE: RangeInclusive<f32> = 100.0..=2000.0;

    /// Max pitch randomization in semitones, before scale quantization.
    const MAX_PITCH_SPREAD: f32 = 7.0;
    /// Spawn intervals are the grain size divided by density times this factor.
    const OVERLAP_FACTOR: f32 = 2.0;
    const MIN_DENSITY: f32 = 0.01;

    /// Creates a new `ScatterEffect` with default parameter values.
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    /// Creates a new `ScatterEffect` with a deterministic random number generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        let to_string_percent = |v: f32| format!("{:.1}", v * 100.0);
        let from_string_percent = |v: &str| v.parse::<f32>().map(|f| f / 100.0).ok();

        let percent = |id: FourCC, name: &'static str, default: f32| {
            FloatParameter::new(id, name, 0.0..=1.0, default)
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent)
        };

        let parameters = SharedParameters::new([
            SharedParameterDescriptor::from(
                FloatParameter::new(
                    Self::DELAY_TIME_ID,
                    "Delay Time",
                    Self::DELAY_TIME_RANGE,
                    500.0,
                )
                .with_unit("ms")
                .with_scaling(ParameterScaling::Exponential(2.0)),
            ),
            FloatParameter::new(Self::GRAIN_SIZE_ID, "Grain Size", GRAIN_SIZE_RANGE, 100.0)
                .with_unit("ms")
                .with_scaling(ParameterScaling::Exponential(2.0))
                .into(),
            percent(Self::DENSITY_ID, "Density", 0.5).into(),
            percent(Self::PITCH_RANDOM_ID, "Pitch Random", 0.3).into(),
            EnumParameter::new(Self::SCALE_ID, "Scale", PitchScale::Chromatic).into(),
            EnumParameter::new(Self::ROOT_NOTE_ID, "Root Note", RootNote::C).into(),
            percent(Self::PAN_RANDOM_ID, "Pan Random", 0.75).into(),
            percent(Self::FEEDBACK_ID, "Feedback", 0.3).into(),
            percent(Self::MIX_ID, "Mix", 0.5).into(),
        ]);

        Self {
            sample_rate: 0,
            channel_count: 0,
            parameters,
            buffer: DelayBuffer::default(),
            pool: GrainPool::new(),
            scheduler: GrainScheduler::new(),
            feedback: FeedbackPath::new(),
            mix: ExponentialSmoothedValue::default(),
            mix_initialized: false,
            mix_law: MixLaw::Linear,
            rng,
        }
    }

    /// Use the given dry/wet crossfade law.
    pub fn with_mix_law(mut self, mix_law: MixLaw) -> Self {
        self.mix_law = mix_law;
        self
    }

    /// A handle to the effect's parameter values, which can be used to change parameters from
    /// other threads without locking. Changes are applied in the next processed block.
    pub fn shared_parameters(&self) -> SharedParameters {
        self.parameters.clone()
    }

    /// All grain voices, playing or not.
    pub fn voices(&self) -> &[GrainVoice] {
        self.pool.voices()
    }

    /// Number of currently playing grains.
    pub fn active_voice_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Grain spawn interval in samples, as calculated in the last processed block.
    pub fn next_grain_interval(&self) -> u32 {
        self.scheduler.next_grain_interval()
    }

    /// Copy positions of all playing grains into `positions`. Returns the number of positions.
    pub fn grain_positions(&self, positions: &mut [GrainPosition]) -> usize {
        self.pool.grain_positions(self.buffer.capacity(), positions)
    }

    fn reset(&mut self) {
        self.buffer.flush();
        self.pool.reset();
        self.scheduler.reset();
        self.feedback.reset();
        self.mix_initialized = false;
    }

    fn begin_block(&mut self) -> ScatterBlock {
        let parameters = &self.parameters;
        let value = |id: FourCC, default: f32| parameters.get(id).unwrap_or(default);

        let delay_ms = value(Self::DELAY_TIME_ID, 500.0);
        let grain_ms = value(Self::GRAIN_SIZE_ID, 100.0);
        let density = value(Self::DENSITY_ID, 0.5);
        let feedback = value(Self::FEEDBACK_ID, 0.3);
        let mix = value(Self::MIX_ID, 0.5).clamp(0.0, 1.0);

        let sample_rate = self.sample_rate as f32;
        let grain_samples = ((grain_ms * sample_rate / 1000.0) as u32).max(1);
        let interval =
            grain_samples as f32 / (density.max(Self::MIN_DENSITY) * Self::OVERLAP_FACTOR);
        self.scheduler.set_interval(interval as u32);
        self.feedback.set_amount(feedback);
        if self.mix_initialized {
            self.mix.set_target(mix);
        } else {
            self.mix.init(mix);
            self.mix_initialized = true;
        }

        ScatterBlock {
            delay_samples: (delay_ms * sample_rate / 1000.0).clamp(1.0, self.buffer.max_delay()),
            grain_samples,
            pitch_random: value(Self::PITCH_RANDOM_ID, 0.3).clamp(0.0, 1.0),
            pan_random: value(Self::PAN_RANDOM_ID, 0.75).clamp(0.0, 1.0),
            scale: parameters.get_enum(Self::SCALE_ID).unwrap_or_default(),
            root_note: parameters.get_enum(Self::ROOT_NOTE_ID).unwrap_or_default(),
        }
    }

    fn grain_start(&mut self, block: &ScatterBlock) -> GrainStart {
        let pitch = (self.rng.random::<f32>() * 2.0 - 1.0)
            * Self::MAX_PITCH_SPREAD
            * block.pitch_random;
        let pitch_semitones = quantize_pitch_to_scale(pitch, block.scale, block.root_note);
        let pan = (0.5 + (self.rng.random::<f32>() - 0.5) * block.pan_random).clamp(0.0, 1.0);
        let reverse = self.rng.random_bool(0.5);
        GrainStart {
            read_position: block.delay_samples,
            pitch_semitones,
            pan,
            length_samples: block.grain_samples,
            reverse,
        }
    }

    #[inline]
    fn process_frame(&mut self, frame: [f32; 2], block: &ScatterBlock) -> [f32; 2] {
        let input = (frame[0] + frame[1]) * 0.5;
        self.buffer.write([input + self.feedback.sample()]);

        if self.scheduler.tick(&mut self.rng, 0.0) {
            let start = self.grain_start(block);
            let _ = self.pool.trigger(&start);
        }

        let [wet_left, wet_right] =
            self.pool
                .process_sample(&self.buffer, GrainWindow::Hann, 0.0, PanLaw::Linear);
        self.feedback.process(wet_left, wet_right);

        let (dry_gain, wet_gain) = self.mix_law.gains(self.mix.next());
        [
            frame[0] * dry_gain + wet_left * wet_gain,
            frame[1] * dry_gain + wet_right * wet_gain,
        ]
    }
}

impl Default for ScatterEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for ScatterEffect {
    fn name(&self) -> &'static str {
        Self::EFFECT_NAME
    }

    fn parameters(&self) -> Vec<&dyn ClonableParameter> {
        self.parameters.descriptors()
    }

    fn initialize(
        &mut self,
        sample_rate: u32,
        channel_count: usize,
        max_frames: usize,
    ) -> Result<(), Error> {
        self.channel_count = channel_count;
        if channel_count != 2 {
            return Err(Error::ParameterError(
                "ScatterEffect only supports stereo I/O".to_owned(),
            ));
        }
        if sample_rate == 0 {
            return Err(Error::ParameterError(
                "ScatterEffect sample rate must be > 0".to_owned(),
            ));
        }
        if max_frames == 0 {
            return Err(Error::ParameterError(
                "ScatterEffect block size must be > 0".to_owned(),
            ));
        }
        self.sample_rate = sample_rate;

        let capacity = (MAX_DELAY_SECONDS * sample_rate as f32).ceil() as usize;
        self.buffer = DelayBuffer::new(capacity);
        self.mix.set_sample_rate(sample_rate);
        LazyLock::force(&HANN_WINDOW_TABLE);
        self.reset();

        log::debug!(
            "Initialized {} with {} Hz, {} frames, {} voices",
            Self::EFFECT_NAME,
            sample_rate,
            max_frames,
            Self::VOICE_COUNT
        );
        Ok(())
    }

    fn process(&mut self, output: &mut [f32], _time: &EffectTime) {
        if self.buffer.is_empty() {
            output.fill(0.0);
            return;
        }
        debug_assert!(self.channel_count == 2, "Expecting stereo buffers");
        utils::assert_no_alloc(|| {
            let block = self.begin_block();
            for frame in output.as_frames_mut::<2>() {
                *frame = self.process_frame(*frame, &block);
            }
        });
    }

    fn process_tail(&self) -> Option<usize> {
        let feedback = self.parameters.get(Self::FEEDBACK_ID).unwrap_or(0.0);
        if feedback > 0.0 {
            Some(usize::MAX)
        } else {
            // reverse grains may read up to one buffer length into the past
            Some(self.buffer.capacity())
        }
    }

    fn process_parameter_update(
        &mut self,
        id: FourCC,
        value: &ParameterValueUpdate,
    ) -> Result<(), Error> {
        match id {
            Self::SCALE_ID => self.parameters.apply_enum_update::<PitchScale>(id, value),
            Self::ROOT_NOTE_ID => self.parameters.apply_enum_update::<RootNote>(id, value),
            _ => self.parameters.apply_update(id, value),
        }
    }

    fn process_message(&mut self, message: &EffectMessagePayload) -> Result<(), Error> {
        if let Some(message) = message.payload().downcast_ref::<ScatterEffectMessage>() {
            match message {
                ScatterEffectMessage::Reset => self.reset(),
            }
            Ok(())
        } else {
            Err(Error::UnsupportedMessage(format!(
                "{}: Received unexpected message payload.",
                self.name()
            )))
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn initialized_effect() -> ScatterEffect {
        let mut effect = ScatterEffect::with_seed(0x5ca7);
        effect.initialize(48000, 2, 512).unwrap();
        effect
    }

    #[test]
    fn initialize() {
        let mut effect = ScatterEffect::with_seed(1);
        assert!(effect.initialize(48000, 4, 512).is_err());
        assert!(effect.initialize(0, 2, 512).is_err());
        assert!(effect.initialize(48000, 2, 0).is_err());
        assert!(effect.initialize(44100, 2, 512).is_ok());
        assert_eq!(effect.parameters().len(), 9);
        assert_eq!(effect.voices().len(), ScatterEffect::VOICE_COUNT);
    }

    #[test]
    fn spawn_intervals() {
        let mut effect = initialized_effect();
        let parameters = effect.shared_parameters();
        let mut buffer = vec![0.0; 1024];

        // 100 ms grains at 50% density
        effect.process(&mut buffer, &EffectTime::default());
        assert_eq!(effect.next_grain_interval(), 4800);

        parameters.set(ScatterEffect::DENSITY_ID, 1.0).unwrap();
        effect.process(&mut buffer, &EffectTime::default());
        assert_eq!(effect.next_grain_interval(), 2400);

        parameters.set(ScatterEffect::DENSITY_ID, 0.0).unwrap();
        effect.process(&mut buffer, &EffectTime::default());
        assert_eq!(effect.next_grain_interval(), 240_000);

        parameters.set(ScatterEffect::GRAIN_SIZE_ID, 5.0).unwrap();
        parameters.set(ScatterEffect::DENSITY_ID, 1.0).unwrap();
        effect.process(&mut buffer, &EffectTime::default());
        assert_eq!(effect.next_grain_interval(), 120);
    }

    #[test]
    fn grain_starts() {
        let mut effect = initialized_effect();
        let parameters = effect.shared_parameters();
        parameters.set(ScatterEffect::PITCH_RANDOM_ID, 1.0).unwrap();
        parameters.set(ScatterEffect::PAN_RANDOM_ID, 0.5).unwrap();
        parameters.set_enum(ScatterEffect::SCALE_ID, PitchScale::Major).unwrap();

        let block = effect.begin_block();
        assert_eq!(block.delay_samples, 24000.0);
        assert_eq!(block.grain_samples, 4800);

        let starts = (0..1000)
            .map(|_| effect.grain_start(&block))
            .collect::<Vec<_>>();
        let reversed = starts.iter().filter(|start| start.reverse).count();
        assert!((400..600).contains(&reversed));
        for start in &starts {
            assert_eq!(start.read_position, 24000.0);
            assert!((-12..=12).contains(&start.pitch_semitones));
            assert!(PitchScale::Major
                .intervals()
                .contains(&start.pitch_semitones.rem_euclid(12)));
            assert!((0.25..=0.75).contains(&start.pan));
        }

        // no pitch randomization: all grains play at the root note
        parameters.set(ScatterEffect::PITCH_RANDOM_ID, 0.0).unwrap();
        parameters.set_enum(ScatterEffect::ROOT_NOTE_ID, RootNote::D).unwrap();
        let block = effect.begin_block();
        assert!((0..100).all(|_| effect.grain_start(&block).pitch_semitones == 2));
    }

    #[test]
    fn parameter_updates() {
        let mut effect = initialized_effect();
        effect
            .process_parameter_update(
                ScatterEffect::SCALE_ID,
                &ParameterValueUpdate::Raw(Arc::new(PitchScale::Blues)),
            )
            .unwrap();
        effect
            .process_parameter_update(
                ScatterEffect::ROOT_NOTE_ID,
                &ParameterValueUpdate::Normalized(1.0),
            )
            .unwrap();
        effect
            .process_parameter_update(
                ScatterEffect::DELAY_TIME_ID,
                &ParameterValueUpdate::Raw(Arc::new(50.0f32)),
            )
            .unwrap();
        let parameters = effect.shared_parameters();
        assert_eq!(
            parameters.get_enum::<PitchScale>(ScatterEffect::SCALE_ID),
            Some(PitchScale::Blues)
        );
        assert_eq!(
            parameters.get_enum::<RootNote>(ScatterEffect::ROOT_NOTE_ID),
            Some(RootNote::B)
        );
        assert_eq!(parameters.get(ScatterEffect::DELAY_TIME_ID), Some(100.0));
    }

    #[test]
    fn wet_signal() {
        let mut effect = initialized_effect();
        let parameters = effect.shared_parameters();
        parameters.set(ScatterEffect::DELAY_TIME_ID, 100.0).unwrap();
        parameters.set(ScatterEffect::FEEDBACK_ID, 1.0).unwrap();
        parameters.set(ScatterEffect::DENSITY_ID, 1.0).unwrap();
        parameters.set(ScatterEffect::MIX_ID, 1.0).unwrap();

        let mut buffer = vec![0.0; 1024];
        let mut peak = 0.0f32;
        let mut positions = [GrainPosition::default(); ScatterEffect::VOICE_COUNT];
        for block in 0..400 {
            for (index, sample) in buffer.iter_mut().enumerate() {
                *sample = if block < 20 {
                    ((block * 1024 + index) as f32 * 0.02).sin() * 0.5
                } else {
                    0.0
                };
            }
            effect.process(&mut buffer, &EffectTime::default());
            assert!(buffer.iter().all(|s| s.is_finite()));
            peak = peak.max(buffer.iter().fold(0.0f32, |max, s| max.max(s.abs())));

            let count = effect.grain_positions(&mut positions);
            assert_eq!(count, effect.active_voice_count());
            for position in &positions[..count] {
                assert!((0.0..=1.0).contains(&position.x));
                assert!((-1.0..=1.0).contains(&position.y));
            }
        }
        assert!(peak > 0.0);
    }

    #[test]
    fn messages() {
        let mut effect = initialized_effect();
        let mut buffer = vec![0.5; 1024];
        for _ in 0..20 {
            effect.process(&mut buffer, &EffectTime::default());
            buffer.fill(0.5);
        }
        assert!(effect.active_voice_count() > 0);
        assert!(effect.process_message(&ScatterEffectMessage::Reset).is_ok());
        assert_eq!(effect.active_voice_count(), 0);

        // only reset state is audible after a reset
        let parameters = effect.shared_parameters();
        parameters.set(ScatterEffect::MIX_ID, 1.0).unwrap();
        let mut buffer = vec![0.0; 1024];
        effect.process(&mut buffer, &EffectTime::default());
        assert!(buffer.iter().all(|s| *s == 0.0));
    }
}
