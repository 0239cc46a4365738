//! Error types shared across the crate

use crate::body::NaifId;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while building or running a propagation
///
/// None of these are recovered from inside the integration loop: any error
/// aborts the current call and is handed back to the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Rejected at construction (non-positive step, negative mass, missing engines...)
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Input outside its valid domain (e < 0, a <= 0, maneuver before window start...)
    #[error("value out of range: {message}")]
    OutOfRange { message: String },

    /// Not enough propellant left for a maneuver
    #[error("insufficient fuel for {maneuver}: requires {required_kg:.3} kg, {available_kg:.3} kg available")]
    InsufficientFuel {
        maneuver: String,
        required_kg: f64,
        available_kg: f64,
    },

    /// An iterative solver did not converge
    #[error("{solver} failed to converge after {iterations} iterations")]
    Convergence {
        solver: &'static str,
        iterations: usize,
    },

    /// Two bodies share no ancestor in the body tree
    #[error("bodies {first} and {second} have no common center of motion")]
    NoCommonCenter { first: NaifId, second: NaifId },

    /// Arithmetic between states defined at different epochs
    #[error("epoch mismatch between state vectors")]
    EpochMismatch,

    /// Arithmetic between states expressed in different frames
    #[error("frame mismatch: {left} vs {right}")]
    FrameMismatch { left: String, right: String },

    /// Body id not registered
    #[error("unknown body {id}")]
    UnknownBody { id: NaifId },

    /// Frame name not known by the ephemeris provider
    #[error("unknown frame {name}")]
    UnknownFrame { name: String },

    /// Request the collaborator cannot serve
    #[error("unsupported request: {message}")]
    Unsupported { message: String },

    /// Two-line element set could not be parsed or propagated
    #[error("TLE error: {message}")]
    Tle { message: String },

    /// Settings could not be parsed
    #[error("settings error: {message}")]
    Settings { message: String },
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub(crate) fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }
}
