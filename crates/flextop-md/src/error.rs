//! Error types for flextop-md.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MdError {
    #[error("{stage} constraint solve did not converge after {iterations} iterations (residual {residual:.3e})")]
    ConstraintFailure {
        stage: &'static str,
        iterations: usize,
        residual: f64,
    },

    #[error("Invalid constraint between particles {i} and {j}: {reason}")]
    InvalidConstraint {
        i: usize,
        j: usize,
        reason: &'static str,
    },

    #[error("Real particles must be added before ghosts ({n_ghosts} ghosts already present)")]
    ParticleOrder { n_ghosts: usize },

    #[error("Evaluation holds {actual} forces for a system of {expected} particles")]
    ForceCount { expected: usize, actual: usize },

    #[error("Force term '{term}' does not fit the system: {reason}")]
    InvalidTerm { term: String, reason: String },
}

pub type Result<T> = std::result::Result<T, MdError>;
