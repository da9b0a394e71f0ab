//! Parameter-space dynamics: one update per ghost and parameter per step.
//!
//! Update rules, with `F = -dE/dp`, coefficient `c`, timestep `dt`:
//! - Deterministic: `v += dt*F/c`, `p = clamp(p + dt*v)`
//! - Inertial (velocity Verlet): `v += dt/2*F/c`, `p = clamp(p + dt*v)`, then a
//!   second `v += dt/2*F'/c` with derivatives recomputed at the new `p`
//! - Langevin: `p = clamp(p + dt*F/c + sqrt(2*kT*dt/c)*N(0,1))`
//! - LangevinConserved: Langevin, then a [`Conservation`] correction
//!
//! Clamping happens once, after the full additive update including noise.

use crate::{
    Bounds, Coefficients, ConfigError, Conservation, EnergyDerivatives, Parameter, Result,
    SignalStore,
};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Update rule of the parameter stepper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterRule {
    Deterministic,
    Inertial,
    Langevin,
    LangevinConserved(Conservation),
}

impl ParameterRule {
    pub fn name(&self) -> &'static str {
        match self {
            ParameterRule::Deterministic => "deterministic",
            ParameterRule::Inertial => "inertial",
            ParameterRule::Langevin => "langevin",
            ParameterRule::LangevinConserved(_) => "langevin_conserved",
        }
    }

    pub fn is_stochastic(&self) -> bool {
        matches!(
            self,
            ParameterRule::Langevin | ParameterRule::LangevinConserved(_)
        )
    }

    /// Whether the rule needs derivatives re-evaluated at the updated
    /// parameter values to finish the step.
    pub fn needs_second_half(&self) -> bool {
        matches!(self, ParameterRule::Inertial)
    }

    pub fn conservation(&self) -> Option<&Conservation> {
        match self {
            ParameterRule::LangevinConserved(c) => Some(c),
            _ => None,
        }
    }
}

/// What happens to the auxiliary velocity of a value that hit a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityOnClamp {
    /// Velocity keeps integrating the force.
    #[default]
    Keep,
    /// Velocity is zeroed whenever the value is clamped.
    Reset,
}

/// Outcome of one parameter step, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepSummary {
    /// Number of (ghost, parameter) values that were clamped.
    pub clamped: usize,
    /// Excess removed by the conservation correction.
    pub corrected: Option<f64>,
}

/// Advances a [`SignalStore`] by one timestep.
#[derive(Debug, Clone)]
pub struct ParameterStepper {
    rule: ParameterRule,
    bounds: Bounds,
    coefficients: Coefficients,
    dt: f64,
    kt: f64,
    on_clamp: VelocityOnClamp,
}

impl ParameterStepper {
    /// `kt` is the thermal energy shared with the spatial thermostat; it is only
    /// read by the Langevin rules and may be zero.
    pub fn new(
        rule: ParameterRule,
        bounds: Bounds,
        coefficients: Coefficients,
        dt: f64,
        kt: f64,
    ) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "timestep",
                value: dt,
            });
        }
        if !(kt.is_finite() && kt >= 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "thermal energy",
                value: kt,
            });
        }
        Ok(Self {
            rule,
            bounds,
            coefficients,
            dt,
            kt,
            on_clamp: VelocityOnClamp::Keep,
        })
    }

    pub fn with_velocity_on_clamp(mut self, policy: VelocityOnClamp) -> Self {
        self.on_clamp = policy;
        self
    }

    pub fn rule(&self) -> &ParameterRule {
        &self.rule
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn kt(&self) -> f64 {
        self.kt
    }

    /// Main update for every ghost and parameter, followed by the conservation
    /// correction when the rule carries one. Gaussian draws are taken ghost-major
    /// in [`Parameter::ALL`] order, one per pair, and only by stochastic rules.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        store: &mut SignalStore,
        derivatives: &EnergyDerivatives,
        rng: &mut R,
    ) -> Result<StepSummary> {
        check_ghost_count(store, derivatives)?;
        store.load_forces(derivatives);

        let dt = self.dt;
        let mut summary = StepSummary::default();

        for g in 0..store.n_ghosts() {
            for p in Parameter::ALL {
                let force = derivatives.force(g, p);
                let c = self.coefficients.get(p);
                let value = store.value(g, p);

                let unclamped = match self.rule {
                    ParameterRule::Deterministic => {
                        let v = store.velocity(g, p) + dt * force / c;
                        store.set_velocity(g, p, v);
                        value + dt * v
                    }
                    ParameterRule::Inertial => {
                        let v = store.velocity(g, p) + 0.5 * dt * force / c;
                        store.set_velocity(g, p, v);
                        value + dt * v
                    }
                    ParameterRule::Langevin | ParameterRule::LangevinConserved(_) => {
                        let noise: f64 = rng.sample(StandardNormal);
                        value + dt * force / c + (2.0 * self.kt * dt / c).sqrt() * noise
                    }
                };

                let clamped = self.bounds.clamp(p, unclamped);
                if clamped != unclamped {
                    summary.clamped += 1;
                    if self.on_clamp == VelocityOnClamp::Reset {
                        store.set_velocity(g, p, 0.0);
                    }
                }
                store.set_value(g, p, clamped);
            }
        }

        if let Some(conservation) = self.rule.conservation() {
            summary.corrected = Some(conservation.apply(store, &self.bounds));
        }

        log::debug!(
            "{} parameter step: {} clamped, correction {:?}",
            self.rule.name(),
            summary.clamped,
            summary.corrected
        );
        Ok(summary)
    }

    /// Second half kick of the inertial rule, using derivatives evaluated at
    /// the parameter values produced by [`ParameterStepper::advance`]. Every
    /// ghost is kicked with its own derivative. No-op for other rules.
    pub fn finish(&self, store: &mut SignalStore, derivatives: &EnergyDerivatives) -> Result<()> {
        if !self.rule.needs_second_half() {
            return Ok(());
        }
        check_ghost_count(store, derivatives)?;
        store.load_forces(derivatives);
        for g in 0..store.n_ghosts() {
            for p in Parameter::ALL {
                let c = self.coefficients.get(p);
                let v = store.velocity(g, p) + 0.5 * self.dt * derivatives.force(g, p) / c;
                store.set_velocity(g, p, v);
            }
        }
        Ok(())
    }
}

fn check_ghost_count(store: &SignalStore, derivatives: &EnergyDerivatives) -> Result<()> {
    if store.n_ghosts() != derivatives.n_ghosts() {
        return Err(ConfigError::GhostCountMismatch {
            expected: store.n_ghosts(),
            actual: derivatives.n_ghosts(),
        });
    }
    Ok(())
}
