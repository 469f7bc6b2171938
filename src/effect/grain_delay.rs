use std::any::Any;

use four_cc::FourCC;

use crate::{
    effect::{Effect, EffectMessage, EffectMessagePayload, EffectTime},
    grain::{GrainEngine, GrainParameters, MixLaw, DELAY_TIME_RANGE, GRAIN_SIZE_RANGE},
    parameter::{
        BooleanParameter, FloatParameter, ParameterScaling, ParameterValueUpdate,
        SharedParameterDescriptor, SharedParameters,
    },
    utils::tempo::DEFAULT_BPM,
    ClonableParameter, Error,
};

// -------------------------------------------------------------------------------------------------

/// Message type for `GrainDelayEffect`.
#[derive(Clone, Debug)]
pub enum GrainDelayEffectMessage {
    /// Silence the delay buffer and stop all playing grains.
    Reset,
}

impl EffectMessage for GrainDelayEffectMessage {
    fn effect_name(&self) -> &'static str {
        GrainDelayEffect::EFFECT_NAME
    }
    fn payload(&self) -> &dyn Any {
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// A stereo, tempo synced granular delay.
///
/// The stereo input gets downmixed and written into the engine's delay buffer, from which up to
/// 32 randomized grains play back. See [`GrainEngine`] for details.
///
/// Parameters can be changed in the audio thread via `process_parameter_update` or from any
/// other thread via the [`shared_parameters`](Self::shared_parameters) handle.
pub struct GrainDelayEffect {
    channel_count: usize,
    parameters: SharedParameters,
    engine: GrainEngine,
}

impl GrainDelayEffect {
    pub const EFFECT_NAME: &str = "GrainDelayEffect";
    pub const DELAY_TIME_ID: FourCC = FourCC(*b"dlay");
    pub const GRAIN_SIZE_ID: FourCC = FourCC(*b"grsz");
    pub const FEEDBACK_ID: FourCC = FourCC(*b"fdbk");
    pub const CHAOS_ID: FourCC = FourCC(*b"chos");
    pub const CHARACTER_ID: FourCC = FourCC(*b"char");
    pub const MIX_ID: FourCC = FourCC(*b"mix_");
    pub const TEMPO_SYNC_ID: FourCC = FourCC(*b"sync");

    /// Creates a new `GrainDelayEffect` with default parameter values.
    pub fn new() -> Self {
        Self::with_engine(GrainEngine::new())
    }

    /// Creates a new `GrainDelayEffect` with a deterministic random number generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_engine(GrainEngine::with_seed(seed))
    }

    fn with_engine(engine: GrainEngine) -> Self {
        let to_string_percent = |v: f32| format!("{:.1}", v * 100.0);
        let from_string_percent = |v: &str| v.parse::<f32>().map(|f| f / 100.0).ok();

        let defaults = GrainParameters::default();
        let parameters = SharedParameters::new([
            SharedParameterDescriptor::from(
                FloatParameter::new(
                    Self::DELAY_TIME_ID,
                    "Delay Time",
                    DELAY_TIME_RANGE,
                    defaults.delay_time_ms,
                )
                .with_unit("ms")
                .with_scaling(ParameterScaling::Exponential(2.0)),
            ),
            FloatParameter::new(
                Self::GRAIN_SIZE_ID,
                "Grain Size",
                GRAIN_SIZE_RANGE,
                defaults.grain_size_ms,
            )
            .with_unit("ms")
            .with_scaling(ParameterScaling::Exponential(2.0))
            .into(),
            FloatParameter::new(Self::FEEDBACK_ID, "Feedback", 0.0..=1.0, defaults.feedback)
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent)
                .into(),
            FloatParameter::new(Self::CHAOS_ID, "Chaos", 0.0..=1.0, defaults.chaos)
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent)
                .into(),
            FloatParameter::new(
                Self::CHARACTER_ID,
                "Character",
                0.0..=1.0,
                defaults.character,
            )
            .with_unit("%")
            .with_display(to_string_percent, from_string_percent)
            .into(),
            FloatParameter::new(Self::MIX_ID, "Mix", 0.0..=1.0, defaults.mix)
                .with_unit("%")
                .with_display(to_string_percent, from_string_percent)
                .into(),
            BooleanParameter::new(Self::TEMPO_SYNC_ID, "Tempo Sync", defaults.tempo_sync).into(),
        ]);

        Self {
            channel_count: 0,
            parameters,
            engine,
        }
    }

    /// Use the given dry/wet crossfade law.
    pub fn with_mix_law(mut self, mix_law: MixLaw) -> Self {
        self.engine = self.engine.with_mix_law(mix_law);
        self
    }

    /// A handle to the effect's parameter values, which can be used to change parameters from
    /// other threads without locking. Changes are applied in the next processed block.
    pub fn shared_parameters(&self) -> SharedParameters {
        self.parameters.clone()
    }

    /// Read-only access to the wrapped grain engine, e.g. to visualize grains.
    pub fn engine(&self) -> &GrainEngine {
        &self.engine
    }

    /// Snapshot of the current parameter values.
    fn grain_parameters(&self, time: &EffectTime) -> GrainParameters {
        let defaults = GrainParameters::default();
        let parameters = &self.parameters;
        GrainParameters {
            delay_time_ms: parameters
                .get(Self::DELAY_TIME_ID)
                .unwrap_or(defaults.delay_time_ms),
            grain_size_ms: parameters
                .get(Self::GRAIN_SIZE_ID)
                .unwrap_or(defaults.grain_size_ms),
            feedback: parameters
                .get(Self::FEEDBACK_ID)
                .unwrap_or(defaults.feedback),
            chaos: parameters.get(Self::CHAOS_ID).unwrap_or(defaults.chaos),
            character: parameters
                .get(Self::CHARACTER_ID)
                .unwrap_or(defaults.character),
            mix: parameters.get(Self::MIX_ID).unwrap_or(defaults.mix),
            tempo_sync: parameters
                .get_bool(Self::TEMPO_SYNC_ID)
                .unwrap_or(defaults.tempo_sync),
            tempo_bpm: time.bpm.unwrap_or(DEFAULT_BPM),
        }
    }
}

impl Default for GrainDelayEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for GrainDelayEffect {
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
                "GrainDelayEffect only supports stereo I/O".to_owned(),
            ));
        }
        self.engine.prepare(sample_rate, max_frames)?;
        log::debug!(
            "Initialized {} with {} Hz, {} frames",
            Self::EFFECT_NAME,
            sample_rate,
            max_frames
        );
        Ok(())
    }

    fn process(&mut self, output: &mut [f32], time: &EffectTime) {
        debug_assert!(self.channel_count == 2, "Effect is not initialized");
        let parameters = self.grain_parameters(time);
        self.engine.process_stereo(output, &parameters);
    }

    fn process_tail(&self) -> Option<usize> {
        let feedback = self.parameters.get(Self::FEEDBACK_ID).unwrap_or(0.0);
        if feedback > 0.0 {
            Some(usize::MAX)
        } else {
            // grains read at most one buffer length into the past
            Some(self.engine.buffer_capacity())
        }
    }

    fn process_parameter_update(
        &mut self,
        id: FourCC,
        value: &ParameterValueUpdate,
    ) -> Result<(), Error> {
        self.parameters.apply_update(id, value)
    }

    fn process_message(&mut self, message: &EffectMessagePayload) -> Result<(), Error> {
        if let Some(message) = message.payload().downcast_ref::<GrainDelayEffectMessage>() {
            match message {
                GrainDelayEffectMessage::Reset => self.engine.reset(),
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
    use crate::{effect::scatter::ScatterEffectMessage, Parameter};

    fn initialized_effect() -> GrainDelayEffect {
        let mut effect = GrainDelayEffect::with_seed(0xd1a7);
        effect.initialize(48000, 2, 512).unwrap();
        effect
    }

    #[test]
    fn initialize() {
        let mut effect = GrainDelayEffect::with_seed(1);
        assert!(effect.initialize(48000, 1, 512).is_err());
        assert!(effect.initialize(0, 2, 512).is_err());
        assert!(effect.initialize(48000, 2, 512).is_ok());
        assert_eq!(effect.engine().sample_rate(), 48000);
    }

    #[test]
    fn parameters() {
        let effect = GrainDelayEffect::with_seed(1);
        let parameters = effect.parameters();
        assert_eq!(parameters.len(), 7);
        assert_eq!(parameters[0].id(), GrainDelayEffect::DELAY_TIME_ID);
        assert_eq!(parameters[0].value_to_string(1.0, true), "2000.00 ms");
        assert_eq!(parameters[2].value_to_string(0.5, true), "50.0 %");
        assert_eq!(parameters[6].default_value(), 1.0);
    }

    #[test]
    fn parameter_updates() {
        let mut effect = initialized_effect();
        effect
            .process_parameter_update(
                GrainDelayEffect::GRAIN_SIZE_ID,
                &ParameterValueUpdate::Raw(Arc::new(250.0f32)),
            )
            .unwrap();
        effect
            .process_parameter_update(
                GrainDelayEffect::MIX_ID,
                &ParameterValueUpdate::Normalized(1.0),
            )
            .unwrap();
        assert!(effect
            .process_parameter_update(FourCC(*b"????"), &ParameterValueUpdate::Normalized(0.0))
            .is_err());

        let parameters = effect.grain_parameters(&EffectTime::default());
        assert_eq!(parameters.grain_size_ms, 250.0);
        assert_eq!(parameters.mix, 1.0);
        assert_eq!(parameters.tempo_bpm, DEFAULT_BPM);

        // shared handles change the same values
        effect
            .shared_parameters()
            .set(GrainDelayEffect::CHAOS_ID, 0.75)
            .unwrap();
        let parameters = effect.grain_parameters(&EffectTime::default().with_bpm(90.0));
        assert_eq!(parameters.chaos, 0.75);
        assert_eq!(parameters.tempo_bpm, 90.0);
    }

    #[test]
    fn tempo_sync() {
        let mut effect = initialized_effect();
        let parameters = effect.shared_parameters();
        parameters.set(GrainDelayEffect::DELAY_TIME_ID, 420.0).unwrap();
        parameters.set(GrainDelayEffect::CHARACTER_ID, 0.0).unwrap();

        let mut buffer = vec![0.0; 1024];
        // 120 bpm: snaps to a quarter note
        effect.process(&mut buffer, &EffectTime::default());
        assert_eq!(effect.engine().next_grain_interval(), 24000);
        // 150 bpm: snaps to a quarter note
        effect.process(&mut buffer, &EffectTime::default().with_bpm(150.0));
        assert_eq!(effect.engine().next_grain_interval(), 19200);
        // free running
        parameters.set(GrainDelayEffect::TEMPO_SYNC_ID, 0.0).unwrap();
        effect.process(&mut buffer, &EffectTime::default());
        assert_eq!(effect.engine().next_grain_interval(), 20160);
    }

    #[test]
    fn process() {
        let mut effect = initialized_effect();
        let parameters = effect.shared_parameters();
        parameters.set(GrainDelayEffect::DELAY_TIME_ID, 50.0).unwrap();
        parameters.set(GrainDelayEffect::TEMPO_SYNC_ID, 0.0).unwrap();
        parameters.set(GrainDelayEffect::FEEDBACK_ID, 1.0).unwrap();
        parameters.set(GrainDelayEffect::CHAOS_ID, 1.0).unwrap();

        let mut time = EffectTime::default();
        let mut buffer = vec![0.0; 1024];
        for block in 0..200 {
            for (index, sample) in buffer.iter_mut().enumerate() {
                *sample = if block < 10 {
                    ((block * 1024 + index) as f32 * 0.01).sin() * 0.5
                } else {
                    0.0
                };
            }
            effect.process(&mut buffer, &time);
            time.advance(512);
            assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 2.0));
        }
        assert!(effect.engine().spawned_grain_count() > 0);
        assert_eq!(effect.process_tail(), Some(usize::MAX));
    }

    #[test]
    fn messages() {
        let mut effect = initialized_effect();
        let mut buffer = vec![0.5; 1024];
        for _ in 0..100 {
            effect.process(&mut buffer, &EffectTime::default());
            buffer.fill(0.5);
        }
        assert!(effect.engine().spawned_grain_count() > 0);

        assert!(effect
            .process_message(&GrainDelayEffectMessage::Reset)
            .is_ok());
        assert_eq!(effect.engine().spawned_grain_count(), 0);
        assert_eq!(effect.engine().active_voice_count(), 0);

        assert_eq!(
            GrainDelayEffectMessage::Reset.effect_name(),
            GrainDelayEffect::EFFECT_NAME
        );
        assert!(matches!(
            effect.process_message(&ScatterEffectMessage::Reset),
            Err(Error::UnsupportedMessage(_))
        ));
    }
}
