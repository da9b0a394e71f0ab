//! Run loop with health checks and reporters.

use crate::error::{FlextopError, Result};
use crate::integrator::HybridIntegrator;
use crate::reporter::{Reporter, Snapshot};
use flextop_guardian::{ConservationMonitor, ConservationState, SignalHealth, audit};

/// Drives a [`HybridIntegrator`], auditing the state and notifying
/// reporters as it goes.
#[derive(Debug)]
pub struct Simulation {
    integrator: HybridIntegrator,
    check_interval: usize,
    baseline: ConservationState,
}

impl Simulation {
    pub fn new(integrator: HybridIntegrator) -> Self {
        let baseline = integrator
            .parameters()
            .rule()
            .conservation()
            .map(ConservationState::from_conservation)
            .unwrap_or_default();
        Self {
            integrator,
            check_interval: 1,
            baseline,
        }
    }

    /// Audit every `n` steps instead of every step.
    pub fn with_check_interval(mut self, n: usize) -> Self {
        self.check_interval = n.max(1);
        self
    }

    pub fn integrator(&self) -> &HybridIntegrator {
        &self.integrator
    }

    pub fn integrator_mut(&mut self) -> &mut HybridIntegrator {
        &mut self.integrator
    }

    pub fn into_integrator(self) -> HybridIntegrator {
        self.integrator
    }

    /// Advance `n_steps`, stopping at the first non-finite state.
    pub fn run(&mut self, n_steps: usize, reporters: &mut [&mut dyn Reporter]) -> Result<()> {
        for i in 0..n_steps {
            self.integrator.step(1)?;
            let step = self.integrator.system().step;

            if (i + 1) % self.check_interval == 0 || i + 1 == n_steps {
                self.check()?;
            }

            let due: Vec<usize> = reporters
                .iter()
                .enumerate()
                .filter(|(_, r)| r.interval() > 0 && step % r.interval() as u64 == 0)
                .map(|(k, _)| k)
                .collect();
            if due.is_empty() {
                continue;
            }
            let snapshot = self.snapshot();
            for k in due {
                reporters[k].report(&snapshot);
            }
        }
        Ok(())
    }

    fn check(&self) -> Result<()> {
        let system = self.integrator.system();
        let signals = self.integrator.signals();
        if let Some(detail) = audit(system, signals) {
            log::error!("step {}: {detail}", system.step);
            return Err(FlextopError::NumericalInstability {
                step: system.step,
                detail,
            });
        }

        let monitor =
            ConservationMonitor::check(&self.baseline, signals, self.integrator.parameters().bounds());
        let summary = self.integrator.last_summary();
        match SignalHealth::assess(&monitor, &summary, signals.n_ghosts()) {
            SignalHealth::Nominal => {}
            SignalHealth::Saturated => log::debug!(
                "step {}: {} signal values clamped",
                system.step,
                summary.clamped
            ),
            health => log::warn!(
                "step {}: signal invariants degraded ({health:?}, max error {:.3e}, {} values out of bounds)",
                system.step,
                monitor.max_error(),
                monitor.out_of_bounds.len(),
            ),
        }
        Ok(())
    }

    /// Current state, evaluating energies if they are stale.
    pub fn snapshot(&mut self) -> Snapshot {
        let energies = self.integrator.evaluation().energies.clone();
        let temperature = self.integrator.temperature();
        let system = self.integrator.system();
        Snapshot {
            step: system.step,
            time: system.time,
            signals: self.integrator.signals().records(),
            energies,
            kinetic_energy: system.kinetic_energy(),
            temperature,
            positions: system.positions(),
            velocities: system.velocities(),
        }
    }
}
