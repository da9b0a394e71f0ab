//! Error types for flextop-format.

use flextop_signal::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, FormatError>;
