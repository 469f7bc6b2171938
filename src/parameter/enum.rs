use std::{any::Any, fmt::Debug, sync::Arc};

use four_cc::FourCC;
use strum::IntoEnumIterator;

use super::{Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// An enum parameter descriptor.
///
/// Values are the string representations of all enum variants. Normalized values map linearly
/// to variant indices.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumParameter {
    id: FourCC,
    name: &'static str,
    values: Vec<String>,
    default_index: usize,
}

impl EnumParameter {
    /// Create a new enum parameter descriptor from all variants of `E`.
    pub fn new<E: IntoEnumIterator + ToString + PartialEq>(
        id: FourCC,
        name: &'static str,
        default: E,
    ) -> Self {
        let values = E::iter().map(|v| v.to_string()).collect::<Vec<_>>();
        assert!(!values.is_empty(), "Enum parameters need at least one value");
        let default_index = E::iter().position(|v| v == default).unwrap_or(0);
        Self {
            id,
            name,
            values,
            default_index,
        }
    }

    /// The parameter's identifier.
    pub fn id(&self) -> FourCC {
        self.id
    }

    /// String representations of all values.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Index of the default value.
    pub fn default_index(&self) -> usize {
        self.default_index
    }

    /// Create a raw ParameterValueUpdate for this parameter.
    #[must_use]
    pub fn value_update<E: Any + Send + Sync>(&self, value: E) -> (FourCC, ParameterValueUpdate) {
        (self.id, ParameterValueUpdate::Raw(Arc::new(value)))
    }

    /// Clamp the given value index into the valid index range.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.values.len() - 1)
    }

    /// Index of the given string value, if it's a valid value.
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v.eq_ignore_ascii_case(value.trim()))
    }

    /// Normalize the given value index to a 0.0-1.0 range.
    pub fn normalize_index(&self, index: usize) -> f32 {
        if self.values.len() <= 1 {
            0.0
        } else {
            self.clamp_index(index) as f32 / (self.values.len() - 1) as f32
        }
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding value index.
    pub fn denormalize_index(&self, normalized: f32) -> usize {
        let index = (normalized.clamp(0.0, 1.0) * (self.values.len() - 1) as f32).round();
        self.clamp_index(index as usize)
    }
}

impl Parameter for EnumParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Enum {
            values: self.values.clone(),
        }
    }

    fn default_value(&self) -> f32 {
        self.normalize_index(self.default_index)
    }

    fn value_to_string(&self, normalized: f32, _include_unit: bool) -> String {
        self.values[self.denormalize_index(normalized)].clone()
    }

    fn string_to_value(&self, string: String) -> Option<f32> {
        let index = self.index_of(&string)?;
        Some(self.normalize_index(index))
    }
}

// -------------------------------------------------------------------------------------------------
