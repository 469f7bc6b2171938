use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use four_cc::FourCC;
use strum::IntoEnumIterator;

use super::{
    BooleanParameter, ClonableParameter, EnumParameter, FloatParameter, ParameterValueUpdate,
};
use crate::Error;

// -------------------------------------------------------------------------------------------------

/// An `f32` which can be shared between threads, stored as bits in an [`AtomicU32`].
///
/// All accesses use relaxed ordering: values are independent control values, not
/// synchronization points.
#[derive(Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed)
    }
}

impl Debug for AtomicF32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AtomicF32").field(&self.load()).finish()
    }
}

// -------------------------------------------------------------------------------------------------

/// Descriptor of a single parameter in a [`SharedParameters`] set.
#[derive(Debug, Clone)]
pub enum SharedParameterDescriptor {
    Float(FloatParameter),
    Boolean(BooleanParameter),
    Enum(EnumParameter),
}

impl SharedParameterDescriptor {
    fn id(&self) -> FourCC {
        match self {
            Self::Float(parameter) => parameter.id(),
            Self::Boolean(parameter) => parameter.id(),
            Self::Enum(parameter) => parameter.id(),
        }
    }

    fn as_clonable(&self) -> &dyn ClonableParameter {
        match self {
            Self::Float(parameter) => parameter,
            Self::Boolean(parameter) => parameter,
            Self::Enum(parameter) => parameter,
        }
    }

    /// Plain default value: float value, 0 or 1 for booleans or the enum value index.
    fn default_value(&self) -> f32 {
        match self {
            Self::Float(parameter) => parameter.default_value(),
            Self::Boolean(parameter) => parameter.normalize_value(parameter.default_value()),
            Self::Enum(parameter) => parameter.default_index() as f32,
        }
    }

    /// Clamp or round the given plain value into the parameter's valid value set.
    fn sanitize(&self, value: f32) -> Result<f32, Error> {
        if value.is_nan() {
            return Err(Error::ParameterError(format!(
                "Invalid NaN value for parameter '{}'",
                self.id()
            )));
        }
        Ok(match self {
            Self::Float(parameter) => parameter.clamp_value(value),
            Self::Boolean(parameter) => parameter.normalize_value(value >= 0.5),
            Self::Enum(parameter) => parameter.clamp_index(value.max(0.0).round() as usize) as f32,
        })
    }

    fn normalize(&self, value: f32) -> f32 {
        match self {
            Self::Float(parameter) => parameter.normalize_value(value),
            Self::Boolean(_) => value,
            Self::Enum(parameter) => parameter.normalize_index(value as usize),
        }
    }

    fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        match self {
            Self::Float(parameter) => parameter.denormalize_value(normalized),
            Self::Boolean(parameter) => {
                parameter.normalize_value(parameter.denormalize_value(normalized))
            }
            Self::Enum(parameter) => parameter.denormalize_index(normalized) as f32,
        }
    }
}

impl From<FloatParameter> for SharedParameterDescriptor {
    fn from(parameter: FloatParameter) -> Self {
        Self::Float(parameter)
    }
}

impl From<BooleanParameter> for SharedParameterDescriptor {
    fn from(parameter: BooleanParameter) -> Self {
        Self::Boolean(parameter)
    }
}

impl From<EnumParameter> for SharedParameterDescriptor {
    fn from(parameter: EnumParameter) -> Self {
        Self::Enum(parameter)
    }
}

// -------------------------------------------------------------------------------------------------

#[derive(Debug)]
struct SharedParameter {
    descriptor: SharedParameterDescriptor,
    value: AtomicF32,
}

// -------------------------------------------------------------------------------------------------

/// A fixed set of parameter values which can be read and written from any thread without locks.
///
/// Values are stored as plain values: float values within their range, `0` or `1` for booleans
/// and value indices for enums. Clones share the same values, so a clone can be handed out to
/// UI or automation threads, while the audio thread reads the values once per processed block.
/// Reading and writing never allocates.
#[derive(Debug, Clone, Default)]
pub struct SharedParameters {
    parameters: Arc<[SharedParameter]>,
}

impl SharedParameters {
    /// Create a new parameter set, initialized with the descriptors' default values.
    pub fn new<D: Into<SharedParameterDescriptor>>(descriptors: impl IntoIterator<Item = D>) -> Self {
        let parameters = descriptors
            .into_iter()
            .map(Into::into)
            .map(|descriptor| {
                let value = AtomicF32::new(descriptor.default_value());
                SharedParameter { descriptor, value }
            })
            .collect::<Vec<_>>();
        debug_assert!(
            parameters.iter().enumerate().all(|(index, parameter)| parameters[..index]
                .iter()
                .all(|other| other.descriptor.id() != parameter.descriptor.id())),
            "Duplicate parameter ids"
        );
        Self {
            parameters: parameters.into(),
        }
    }

    /// Number of parameters in the set.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Descriptors of all parameters, in the order they got added.
    pub fn descriptors(&self) -> Vec<&dyn ClonableParameter> {
        self.parameters
            .iter()
            .map(|parameter| parameter.descriptor.as_clonable())
            .collect()
    }

    #[inline]
    fn lookup(&self, id: FourCC) -> Option<&SharedParameter> {
        self.parameters
            .iter()
            .find(|parameter| parameter.descriptor.id() == id)
    }

    fn find(&self, id: FourCC) -> Result<&SharedParameter, Error> {
        self.lookup(id)
            .ok_or_else(|| Error::ParameterError(format!("Unknown parameter: '{id}'")))
    }

    /// Current plain value of the given parameter.
    #[inline]
    pub fn get(&self, id: FourCC) -> Option<f32> {
        self.lookup(id).map(|parameter| parameter.value.load())
    }

    /// Current value of the given parameter, normalized to a 0.0-1.0 range.
    pub fn get_normalized(&self, id: FourCC) -> Option<f32> {
        self.lookup(id)
            .map(|parameter| parameter.descriptor.normalize(parameter.value.load()))
    }

    /// Current value of a boolean parameter.
    pub fn get_bool(&self, id: FourCC) -> Option<bool> {
        self.get(id).map(|value| value >= 0.5)
    }

    /// Current value of an enum parameter, converted to `E`.
    pub fn get_enum<E: IntoEnumIterator>(&self, id: FourCC) -> Option<E> {
        self.get(id)
            .and_then(|index| E::iter().nth(index.max(0.0) as usize))
    }

    /// Set a new plain value. Values get clamped or rounded into the parameter's value set.
    pub fn set(&self, id: FourCC, value: f32) -> Result<(), Error> {
        let parameter = self.find(id)?;
        parameter.value.store(parameter.descriptor.sanitize(value)?);
        Ok(())
    }

    /// Set a new normalized value in range `0.0..=1.0`.
    pub fn set_normalized(&self, id: FourCC, normalized: f32) -> Result<(), Error> {
        let parameter = self.find(id)?;
        if normalized.is_nan() {
            return Err(Error::ParameterError(format!(
                "Invalid NaN value for parameter '{id}'"
            )));
        }
        parameter
            .value
            .store(parameter.descriptor.denormalize(normalized));
        Ok(())
    }

    /// Set a new enum parameter value.
    pub fn set_enum<E: IntoEnumIterator + PartialEq>(&self, id: FourCC, value: E) -> Result<(), Error> {
        let index = E::iter().position(|v| v == value).unwrap_or(0);
        self.set(id, index as f32)
    }

    /// Reset all parameters to their default values.
    pub fn reset(&self) {
        for parameter in self.parameters.iter() {
            parameter.value.store(parameter.descriptor.default_value());
        }
    }

    /// Apply a parameter value update. Raw updates may hold `f32`, `f64`, `bool` or, for enum
    /// parameters, a value index (`usize`) or the value's string representation.
    pub fn apply_update(&self, id: FourCC, update: &ParameterValueUpdate) -> Result<(), Error> {
        let parameter = self.find(id)?;
        match update {
            ParameterValueUpdate::Normalized(normalized) => self.set_normalized(id, *normalized),
            ParameterValueUpdate::Raw(raw) => {
                if let Some(value) = raw.downcast_ref::<f32>() {
                    self.set(id, *value)
                } else if let Some(value) = raw.downcast_ref::<f64>() {
                    self.set(id, *value as f32)
                } else if let Some(value) = raw.downcast_ref::<bool>() {
                    self.set(id, if *value { 1.0 } else { 0.0 })
                } else if let Some(index) = raw.downcast_ref::<usize>() {
                    self.set(id, *index as f32)
                } else if let (Some(string), SharedParameterDescriptor::Enum(descriptor)) =
                    (raw.downcast_ref::<String>(), &parameter.descriptor)
                {
                    match descriptor.index_of(string) {
                        Some(index) => self.set(id, index as f32),
                        None => Err(Error::ParameterError(format!(
                            "Invalid string value '{string}' for enum parameter '{id}'"
                        ))),
                    }
                } else {
                    log::warn!("Invalid value type for parameter '{id}'");
                    Err(Error::ParameterError(format!(
                        "Invalid value type for parameter '{id}'"
                    )))
                }
            }
        }
    }

    /// Apply a parameter value update for an enum parameter, which may hold a raw `E` value.
    pub fn apply_enum_update<E: IntoEnumIterator + PartialEq + 'static>(
        &self,
        id: FourCC,
        update: &ParameterValueUpdate,
    ) -> Result<(), Error> {
        if let ParameterValueUpdate::Raw(raw) = update {
            if let Some(value) = raw.downcast_ref::<E>() {
                let index = E::iter().position(|v| v == *value).unwrap_or(0);
                return self.set(id, index as f32);
            }
        }
        self.apply_update(id, update)
    }
}

// -------------------------------------------------------------------------------------------------
