#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod effect;
mod error;
mod parameter;

// public, flat re-exports
pub use error::Error;

pub use effect::{Effect, EffectMessage, EffectMessagePayload, EffectTime};

pub use parameter::{
    AtomicF32, BooleanParameter, ClonableParameter, EnumParameter, FloatParameter, Parameter,
    ParameterScaling, ParameterType, ParameterValueUpdate, SharedParameterDescriptor,
    SharedParameters,
};

pub use grain::{GrainEngine, GrainParameters};

// public mods
pub mod grain;
pub mod utils;

pub mod effects {
    //! Granular delay effect implementations.

    pub use super::effect::{
        grain_delay::{GrainDelayEffect, GrainDelayEffectMessage},
        scatter::{ScatterEffect, ScatterEffectMessage},
    };
}
