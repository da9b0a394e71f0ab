//! Monitoring of signal-parameter invariants.
//!
//! Tracks conserved ghost totals and bound violations to detect a correction
//! that drifted or a value that escaped its interval.

use flextop_signal::{Bounds, Conservation, Parameter, PerParameter, SignalKey, SignalStore};

/// Conserved totals to check against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConservationState {
    /// Target of `sum_g value[g, p]`, or `None` when `p` is not conserved.
    pub targets: PerParameter<Option<f64>>,
}

impl ConservationState {
    /// Nothing conserved; only bounds are monitored.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, parameter: Parameter, target: f64) -> Self {
        self.targets[parameter] = Some(target);
        self
    }

    /// Targets of a conservation correction.
    pub fn from_conservation(conservation: &Conservation) -> Self {
        Self::new().with_target(conservation.parameter, conservation.target)
    }
}

/// Invariant errors of the current signal state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConservationMonitor {
    /// `|sum_g value[g, p] - target|` per conserved parameter, zero otherwise.
    pub total_error: PerParameter<f64>,
    /// Pairs whose value lies outside its bounds.
    pub out_of_bounds: Vec<SignalKey>,
    /// Largest distance of a value outside its bounds.
    pub max_bound_excess: f64,
}

impl ConservationMonitor {
    /// Check conserved totals and bounds.
    pub fn check(baseline: &ConservationState, store: &SignalStore, bounds: &Bounds) -> Self {
        let total_error = PerParameter::from_fn(|p| match baseline.targets[p] {
            Some(target) => (store.total(p) - target).abs(),
            None => 0.0,
        });

        let mut out_of_bounds = Vec::new();
        let mut max_bound_excess: f64 = 0.0;
        for key in SignalKey::all(store.n_ghosts()) {
            let value = store.value(key.ghost, key.parameter);
            let interval = bounds.get(key.parameter);
            let excess = (interval.low - value).max(value - interval.high);
            if excess > 0.0 {
                out_of_bounds.push(key);
                max_bound_excess = max_bound_excess.max(excess);
            }
        }

        Self {
            total_error,
            out_of_bounds,
            max_bound_excess,
        }
    }

    /// Check if a conserved total drifted beyond `total_tol` or a value left
    /// its bounds by more than `bound_tol`.
    pub fn is_violated(&self, total_tol: f64, bound_tol: f64) -> bool {
        self.total_error.iter().any(|(_, e)| *e > total_tol) || self.max_bound_excess > bound_tol
    }

    /// Largest error across all monitored invariants.
    pub fn max_error(&self) -> f64 {
        self.total_error
            .iter()
            .fold(self.max_bound_excess, |acc, (_, e)| acc.max(*e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextop_signal::{CONSERVATION_TOLERANCE, SignalRecord};

    fn store(charges: &[f64]) -> SignalStore {
        let records: Vec<_> = charges
            .iter()
            .map(|&q| SignalRecord::new(q, 0.1, 1.0, 0.5))
            .collect();
        SignalStore::new(&records, &Bounds::default()).unwrap()
    }

    #[test]
    fn test_corrected_total_passes() {
        let bounds = Bounds::default();
        let mut signals = store(&[0.5, 0.3, -0.2]);
        let conservation = Conservation::charge(0.0);
        let baseline = ConservationState::from_conservation(&conservation);

        let before = ConservationMonitor::check(&baseline, &signals, &bounds);
        assert!(before.is_violated(CONSERVATION_TOLERANCE, 0.0));
        assert!((before.total_error[Parameter::Charge] - 0.6).abs() < 1e-12);

        conservation.apply(&mut signals, &bounds);
        let after = ConservationMonitor::check(&baseline, &signals, &bounds);
        assert!(!after.is_violated(CONSERVATION_TOLERANCE, 0.0));
        assert!(after.max_error() < CONSERVATION_TOLERANCE);
    }

    #[test]
    fn test_bound_violation_detected() {
        let bounds = Bounds::default();
        let mut signals = store(&[0.0, 0.0]);
        signals.set_value(1, Parameter::Lambda, 1.25);

        let monitor = ConservationMonitor::check(&ConservationState::new(), &signals, &bounds);
        assert_eq!(monitor.out_of_bounds, vec![SignalKey::new(1, Parameter::Lambda)]);
        assert!((monitor.max_bound_excess - 0.25).abs() < 1e-12);
        assert!(monitor.is_violated(1.0, 0.1));
        assert!(!monitor.is_violated(1.0, 0.5));
    }

    #[test]
    fn test_unconserved_parameters_report_zero() {
        let signals = store(&[1.0, 1.0]);
        let monitor = ConservationMonitor::check(
            &ConservationState::new(),
            &signals,
            &Bounds::default(),
        );
        assert!(monitor.total_error.iter().all(|(_, e)| *e == 0.0));
        assert_eq!(monitor.max_error(), 0.0);
    }
}
