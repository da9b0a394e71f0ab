//! Run-health grading of the ghost signal state.
//!
//! A healthy run keeps every conserved total within the correction tolerance
//! and every value inside its interval. Frequent clamping is not an error but
//! means the bounds, not the energy, are steering the parameters.

use crate::conservation::ConservationMonitor;
use flextop_signal::{CONSERVATION_TOLERANCE, Parameter, StepSummary};

/// Share of clamped (ghost, parameter) values in one step above which the
/// dynamics count as saturated.
pub const SATURATION_FRACTION: f64 = 0.25;

/// Health of the signal state, from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalHealth {
    /// Totals conserved, values in bounds, clamping rare.
    Nominal,
    /// More than [`SATURATION_FRACTION`] of the values hit a bound last step.
    Saturated,
    /// A value sits outside its interval.
    OutOfBounds,
    /// A conserved total moved more than [`CONSERVATION_TOLERANCE`] from its
    /// target.
    Drifted,
}

impl SignalHealth {
    /// Grade the monitored invariants and the latest parameter step.
    pub fn assess(monitor: &ConservationMonitor, summary: &StepSummary, n_ghosts: usize) -> Self {
        if monitor.total_error.iter().any(|(_, e)| *e > CONSERVATION_TOLERANCE) {
            Self::Drifted
        } else if !monitor.out_of_bounds.is_empty() {
            Self::OutOfBounds
        } else if clamp_fraction(summary, n_ghosts) > SATURATION_FRACTION {
            Self::Saturated
        } else {
            Self::Nominal
        }
    }

    /// Nominal or Saturated.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::Nominal | Self::Saturated)
    }

    /// OutOfBounds or Drifted.
    pub fn needs_intervention(&self) -> bool {
        !self.is_acceptable()
    }
}

/// Clamped values as a share of all `4 * n_ghosts` values.
pub fn clamp_fraction(summary: &StepSummary, n_ghosts: usize) -> f64 {
    let total = n_ghosts * Parameter::ALL.len();
    if total == 0 {
        return 0.0;
    }
    summary.clamped as f64 / total as f64
}
