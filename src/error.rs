use std::{error, fmt};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by grainfield.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Invalid sample rates, block sizes, channel layouts or parameter ids and values.
    ParameterError(String),
    /// An effect received a message it can't handle.
    UnsupportedMessage(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::UnsupportedMessage(str) => write!(f, "Unsupported message: {str}"),
        }
    }
}

// -------------------------------------------------------------------------------------------------
