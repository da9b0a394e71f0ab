//! Configuration errors raised before any stepping occurs.

use crate::{Parameter, SignalKey};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Unknown signal parameter: {0}")]
    UnknownParameter(String),

    #[error("Missing configuration for parameter `{0}`")]
    MissingParameter(Parameter),

    #[error("Invalid bounds for `{parameter}`: low ({low}) must be below high ({high})")]
    InvertedBounds {
        parameter: Parameter,
        low: f64,
        high: f64,
    },

    #[error("Coefficient for `{parameter}` must be positive, got {value}")]
    NonPositiveCoefficient { parameter: Parameter, value: f64 },

    #[error("Initial value for {key} is not finite: {value}")]
    NonFiniteValue { key: SignalKey, value: f64 },

    #[error("Expected {expected} ghost records, got {actual}")]
    GhostCountMismatch { expected: usize, actual: usize },

    #[error("Invalid {name}: {value}")]
    InvalidSetting { name: &'static str, value: f64 },

    #[error("No force term exposes the energy derivative for {0}")]
    MissingDerivative(SignalKey),

    #[error("Invalid signal key: {0}")]
    InvalidKey(String),

    #[error("A thermostat is required by the {0} stage")]
    MissingThermostat(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
