//! Top-level error type.

use flextop_format::FormatError;
use flextop_guardian::Instability;
use flextop_md::MdError;
use flextop_signal::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlextopError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("MD error: {0}")]
    Md(#[from] MdError),

    #[error("Format error: {0}")]
    Format(FormatError),

    #[error("Numerical instability at step {step}: {detail}")]
    NumericalInstability { step: u64, detail: Instability },

    #[error("Integrator has been finalized")]
    Finalized,
}

impl From<FormatError> for FlextopError {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::Config(c) => FlextopError::Config(c),
            other => FlextopError::Format(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlextopError>;
