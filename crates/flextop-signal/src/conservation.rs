//! Global conservation of one signal parameter summed over all ghosts.

use crate::{Bounds, Parameter, SignalStore};
use serde::{Deserialize, Serialize};

/// Absolute tolerance on `|sum - target|` for the re-clamping correction.
pub const CONSERVATION_TOLERANCE: f64 = 1e-10;

/// How the excess `sum - target` is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionPolicy {
    /// Subtract `excess / n_ghosts` from every ghost. The result may leave the
    /// parameter's bounds.
    #[default]
    EqualShare,
    /// Subtract in equal shares, re-clamp, and spread what the clamp gave back
    /// over the ghosts that are still free, until the total matches or every
    /// ghost is pinned.
    Reclamp,
}

/// Keeps `sum_g value[g, parameter]` at `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conservation {
    #[serde(default = "default_parameter")]
    pub parameter: Parameter,
    #[serde(default)]
    pub target: f64,
    #[serde(default)]
    pub policy: CorrectionPolicy,
}

fn default_parameter() -> Parameter {
    Parameter::Charge
}

impl Conservation {
    /// Total-charge conservation with the equal-share correction.
    pub fn charge(target: f64) -> Self {
        Self {
            parameter: Parameter::Charge,
            target,
            policy: CorrectionPolicy::EqualShare,
        }
    }

    pub fn with_policy(mut self, policy: CorrectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// `sum - target` for the current store.
    pub fn excess(&self, store: &SignalStore) -> f64 {
        store.total(self.parameter) - self.target
    }

    /// Apply the correction in place. Returns the excess that was present
    /// before correcting.
    pub fn apply(&self, store: &mut SignalStore, bounds: &Bounds) -> f64 {
        let n = store.n_ghosts();
        let excess = self.excess(store);
        if n == 0 {
            return excess;
        }

        match self.policy {
            CorrectionPolicy::EqualShare => {
                let share = excess / n as f64;
                for g in 0..n {
                    let v = store.value(g, self.parameter);
                    store.set_value(g, self.parameter, v - share);
                }
            }
            CorrectionPolicy::Reclamp => self.reclamp(store, bounds),
        }
        excess
    }

    fn reclamp(&self, store: &mut SignalStore, bounds: &Bounds) {
        let p = self.parameter;
        let interval = bounds.get(p);
        let n = store.n_ghosts();

        // Each pass either meets the target or pins at least one more ghost.
        for _ in 0..=n {
            let remaining = self.excess(store);
            if remaining.abs() <= CONSERVATION_TOLERANCE {
                return;
            }
            let free: Vec<usize> = (0..n)
                .filter(|&g| {
                    let v = store.value(g, p);
                    if remaining > 0.0 { v > interval.low } else { v < interval.high }
                })
                .collect();
            if free.is_empty() {
                break;
            }
            let share = remaining / free.len() as f64;
            for g in free {
                let v = store.value(g, p);
                store.set_value(g, p, interval.clamp(v - share));
            }
        }

        let remaining = self.excess(store);
        if remaining.abs() > CONSERVATION_TOLERANCE {
            log::warn!(
                "cannot conserve total {p} = {} inside bounds; {remaining:.3e} left over",
                self.target
            );
        }
    }
}
