//! Run-time checks for coupled ghost-particle simulations.
//!
//! This crate provides:
//! - Finiteness audit of positions, velocities, and signal state
//! - Monitoring of conserved signal totals and parameter bounds
//! - Health grading of the signal state from drift, bounds, and clamping

pub mod conservation;
pub mod degradation;
pub mod stability;

pub use conservation::{ConservationMonitor, ConservationState};
pub use degradation::{SATURATION_FRACTION, SignalHealth, clamp_fraction};
pub use stability::{Instability, audit};
