//! Composite integrator advancing particle coordinates and ghost signals
//! together.
//!
//! One step:
//! 1. evaluate forces and signal derivatives (reused when still current)
//! 2. spatial update; Verlet re-evaluates at the drifted positions and
//!    finishes the velocity update
//! 3. parameter update from the latest derivatives, clamp, optional
//!    conservation correction
//! 4. inertial rule only: re-evaluate at the new signal values and apply the
//!    second half kick

use crate::error::{FlextopError, Result};
use flextop_format::{IntegratorConfig, SignalCheckpoint};
use flextop_md::{
    Constraints, Evaluation, ForceSet, ForceTerm, ParticleSystem, PhysicalScheme,
    PhysicalStepper, Thermostat, Unconstrained,
};
use flextop_signal::{
    Bounds, Coefficients, ConfigError, Conservation, Parameter, ParameterRule,
    ParameterStepper, SignalRecord, SignalStore, StepSummary, VelocityOnClamp,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

const PHYSICAL_STREAM: u64 = 1;
const SIGNAL_STREAM: u64 = 2;

/// Noise generator of one stream for one step, keyed by `(seed, stream, step)`.
/// A run resumed at step `k` draws exactly what the continuous run draws at `k`.
fn step_rng(seed: u64, stream: u64, step: u64) -> StdRng {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    key[8..16].copy_from_slice(&stream.to_le_bytes());
    key[16..24].copy_from_slice(&step.to_le_bytes());
    StdRng::from_seed(key)
}

/// Preset pairings of spatial scheme and parameter rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegratorVariant {
    /// Leapfrog positions, deterministic parameter dynamics.
    Leapfrog,
    /// Velocity Verlet positions, inertial parameter dynamics.
    Verlet,
    /// Langevin positions and overdamped Langevin parameters.
    Hybrid,
    /// [`IntegratorVariant::Hybrid`] with total ghost charge held at `target`.
    HybridConstCharge { target: f64 },
}

impl IntegratorVariant {
    pub fn scheme(&self) -> PhysicalScheme {
        match self {
            IntegratorVariant::Leapfrog => PhysicalScheme::Leapfrog,
            IntegratorVariant::Verlet => PhysicalScheme::Verlet,
            IntegratorVariant::Hybrid | IntegratorVariant::HybridConstCharge { .. } => {
                PhysicalScheme::LangevinBaoab
            }
        }
    }

    pub fn rule(&self) -> ParameterRule {
        match *self {
            IntegratorVariant::Leapfrog => ParameterRule::Deterministic,
            IntegratorVariant::Verlet => ParameterRule::Inertial,
            IntegratorVariant::Hybrid => ParameterRule::Langevin,
            IntegratorVariant::HybridConstCharge { target } => {
                ParameterRule::LangevinConserved(Conservation::charge(target))
            }
        }
    }
}

/// Lifecycle of an integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorPhase {
    Constructed,
    Stepping,
    Finalized,
}

/// Builder for [`HybridIntegrator`].
pub struct IntegratorBuilder {
    system: ParticleSystem,
    forces: ForceSet,
    records: Vec<SignalRecord>,
    constraints: Arc<dyn Constraints>,
    config: IntegratorConfig,
}

impl IntegratorBuilder {
    /// Start from a particle system with default settings: leapfrog,
    /// deterministic rule, ghost-assembly bounds and coefficients.
    pub fn new(system: ParticleSystem) -> Self {
        Self::from_config(system, IntegratorConfig::default())
    }

    /// Start from a loaded configuration.
    pub fn from_config(system: ParticleSystem, config: IntegratorConfig) -> Self {
        Self {
            system,
            forces: ForceSet::new(),
            records: Vec::new(),
            constraints: Arc::new(Unconstrained),
            config,
        }
    }

    /// Use a preset scheme/rule pairing.
    pub fn variant(mut self, variant: IntegratorVariant) -> Self {
        self.config.scheme = variant.scheme();
        self.config.rule = variant.rule();
        self
    }

    pub fn scheme(mut self, scheme: PhysicalScheme) -> Self {
        self.config.scheme = scheme;
        self
    }

    pub fn rule(mut self, rule: ParameterRule) -> Self {
        self.config.rule = rule;
        self
    }

    /// Set the timestep (ps).
    pub fn timestep(mut self, dt: f64) -> Self {
        self.config.timestep = dt;
        self
    }

    pub fn thermostat(mut self, temperature: f64, friction: f64) -> Self {
        self.config.thermostat = Some(Thermostat {
            temperature,
            friction,
        });
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn bounds(mut self, bounds: &Bounds) -> Self {
        for (p, interval) in bounds.intervals().iter() {
            self = self.bound(p, interval.low, interval.high);
        }
        self
    }

    /// Set one clamping interval. Checked by [`IntegratorBuilder::build`].
    pub fn bound(mut self, parameter: Parameter, low: f64, high: f64) -> Self {
        self.config
            .bounds
            .insert(parameter.name().to_string(), [low, high]);
        self
    }

    pub fn coefficients(mut self, coefficients: &Coefficients) -> Self {
        for (p, &c) in coefficients.values().iter() {
            self = self.coefficient(p, c);
        }
        self
    }

    /// Set one dynamics coefficient. Checked by [`IntegratorBuilder::build`].
    pub fn coefficient(mut self, parameter: Parameter, value: f64) -> Self {
        self.config
            .coefficients
            .insert(parameter.name().to_string(), value);
        self
    }

    pub fn velocity_on_clamp(mut self, policy: VelocityOnClamp) -> Self {
        self.config.velocity_on_clamp = policy;
        self
    }

    /// Reject or merely warn about signal pairs no force term differentiates.
    pub fn strict_derivatives(mut self, strict: bool) -> Self {
        self.config.strict_derivatives = strict;
        self
    }

    /// Initial signal values, one record per ghost in ghost order.
    pub fn signals(mut self, records: Vec<SignalRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn force(mut self, term: Arc<dyn ForceTerm>) -> Self {
        self.forces.add(term);
        self
    }

    pub fn constraints(mut self, constraints: Arc<dyn Constraints>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Validate everything and construct the integrator.
    pub fn build(self) -> Result<HybridIntegrator> {
        let config = self.config;
        config.validate()?;
        let bounds = config.bounds()?;
        let coefficients = config.coefficients()?;

        let n_ghosts = self.system.n_ghosts();
        if self.records.len() != n_ghosts {
            return Err(ConfigError::GhostCountMismatch {
                expected: n_ghosts,
                actual: self.records.len(),
            }
            .into());
        }
        let signals = SignalStore::new(&self.records, &bounds)?;
        self.constraints.validate(self.system.len())?;
        self.forces.validate(&self.system)?;

        let missing = self.forces.missing_derivatives(n_ghosts);
        if let Some(&first) = missing.first() {
            if config.strict_derivatives {
                return Err(ConfigError::MissingDerivative(first).into());
            }
            log::warn!(
                "{} signal pairs have no energy derivative and receive zero force (first: {first})",
                missing.len()
            );
        }

        let kt = config.thermostat.as_ref().map_or(0.0, Thermostat::kt);
        let physical = PhysicalStepper::new(
            config.scheme,
            config.timestep,
            config.thermostat,
            self.constraints,
        )?;
        let parameters =
            ParameterStepper::new(config.rule, bounds, coefficients, config.timestep, kt)?
                .with_velocity_on_clamp(config.velocity_on_clamp);

        log::info!(
            "{} / {} integrator: {} particles ({} ghosts), dt = {} ps, {} force terms",
            config.scheme.name(),
            config.rule.name(),
            self.system.len(),
            n_ghosts,
            config.timestep,
            self.forces.len(),
        );

        let eval = Evaluation::new(self.system.len(), n_ghosts);
        Ok(HybridIntegrator {
            system: self.system,
            signals,
            forces: self.forces,
            physical,
            parameters,
            seed: config.seed,
            eval,
            fresh: false,
            phase: IntegratorPhase::Constructed,
            last_summary: StepSummary::default(),
        })
    }
}

/// Integrator of particle coordinates and ghost signal parameters.
pub struct HybridIntegrator {
    system: ParticleSystem,
    signals: SignalStore,
    forces: ForceSet,
    physical: PhysicalStepper,
    parameters: ParameterStepper,
    seed: u64,
    eval: Evaluation,
    /// `eval` matches the current positions and signal values.
    fresh: bool,
    phase: IntegratorPhase,
    last_summary: StepSummary,
}

impl HybridIntegrator {
    /// Advance `n` composite steps. `step(0)` does nothing.
    pub fn step(&mut self, n: usize) -> Result<()> {
        if self.phase == IntegratorPhase::Finalized {
            return Err(FlextopError::Finalized);
        }
        if n == 0 {
            return Ok(());
        }
        self.phase = IntegratorPhase::Stepping;
        for _ in 0..n {
            self.step_once()?;
        }
        Ok(())
    }

    fn step_once(&mut self) -> Result<()> {
        let step = self.system.step;
        self.refresh();
        self.system.load_forces(&self.eval.forces)?;
        let mut physical_rng = step_rng(self.seed, PHYSICAL_STREAM, step);
        self.physical.advance(&mut self.system, &mut physical_rng)?;

        if self.physical.scheme().needs_post_drift_forces() {
            self.forces
                .evaluate(&self.system, &self.signals, &mut self.eval);
            self.system.load_forces(&self.eval.forces)?;
            self.physical.complete(&mut self.system)?;
        }

        let mut signal_rng = step_rng(self.seed, SIGNAL_STREAM, step);
        self.last_summary =
            self.parameters
                .advance(&mut self.signals, &self.eval.derivatives, &mut signal_rng)?;
        self.fresh = false;

        if self.parameters.rule().needs_second_half() {
            self.forces
                .evaluate(&self.system, &self.signals, &mut self.eval);
            self.parameters.finish(&mut self.signals, &self.eval.derivatives)?;
            self.fresh = true;
        }

        self.system.time += self.physical.dt();
        self.system.step += 1;
        Ok(())
    }

    fn refresh(&mut self) {
        if !self.fresh {
            self.forces
                .evaluate(&self.system, &self.signals, &mut self.eval);
            self.fresh = true;
        }
    }

    /// Stop stepping for good.
    pub fn finalize(&mut self) {
        if self.phase != IntegratorPhase::Finalized {
            log::info!(
                "integrator finalized after {} steps ({:.3} ps)",
                self.system.step,
                self.system.time
            );
        }
        self.phase = IntegratorPhase::Finalized;
    }

    pub fn phase(&self) -> IntegratorPhase {
        self.phase
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    /// Mutable access to positions and velocities. Invalidates the cached
    /// evaluation.
    pub fn system_mut(&mut self) -> &mut ParticleSystem {
        self.fresh = false;
        &mut self.system
    }

    pub fn signals(&self) -> &SignalStore {
        &self.signals
    }

    /// Forces, grouped energies, and derivatives at the current state.
    pub fn evaluation(&mut self) -> &Evaluation {
        self.refresh();
        &self.eval
    }

    pub fn physical(&self) -> &PhysicalStepper {
        &self.physical
    }

    pub fn parameters(&self) -> &ParameterStepper {
        &self.parameters
    }

    pub fn dt(&self) -> f64 {
        self.physical.dt()
    }

    /// Clamp and correction counts of the most recent parameter step.
    pub fn last_summary(&self) -> StepSummary {
        self.last_summary
    }

    /// Instantaneous temperature (K) net of constrained degrees of freedom.
    pub fn temperature(&self) -> f64 {
        self.system
            .temperature(self.physical.constraints().count())
    }

    /// Current signal state for persistence.
    pub fn checkpoint(&self) -> SignalCheckpoint {
        SignalCheckpoint {
            step: self.system.step,
            time: self.system.time,
            seed: self.seed,
            store: self.signals.clone(),
        }
    }

    /// Resume from a checkpoint of a run over the same ghosts, continuing its
    /// noise streams. Positions and velocities are restored separately through
    /// [`HybridIntegrator::system_mut`].
    pub fn restore(&mut self, checkpoint: SignalCheckpoint) -> Result<()> {
        if self.phase == IntegratorPhase::Finalized {
            return Err(FlextopError::Finalized);
        }
        checkpoint.store.validate()?;
        if checkpoint.store.n_ghosts() != self.signals.n_ghosts() {
            return Err(ConfigError::GhostCountMismatch {
                expected: self.signals.n_ghosts(),
                actual: checkpoint.store.n_ghosts(),
            }
            .into());
        }
        self.signals = checkpoint.store;
        self.system.step = checkpoint.step;
        self.system.time = checkpoint.time;
        self.seed = checkpoint.seed;
        self.fresh = false;
        Ok(())
    }
}

impl std::fmt::Debug for HybridIntegrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridIntegrator")
            .field("physical", &self.physical)
            .field("parameters", &self.parameters)
            .field("forces", &self.forces)
            .field("phase", &self.phase)
            .field("step", &self.system.step)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextop_md::{SignalRestraint, Vec3};
    use flextop_signal::PerParameter;

    fn two_ghosts() -> IntegratorBuilder {
        let mut system = ParticleSystem::new();
        system.add_ghost(Vec3::zeros(), 10.0);
        system.add_ghost(Vec3::new(1.0, 0.0, 0.0), 10.0);
        let restraint = SignalRestraint::uniform(
            PerParameter::new(0.0, 0.1, 1.0, 0.5),
            2,
            PerParameter::splat(1.0),
        );
        IntegratorBuilder::new(system)
            .signals(vec![SignalRecord::new(0.0, 0.1, 1.0, 0.5); 2])
            .force(Arc::new(restraint))
    }

    #[test]
    fn test_variant_pairings() {
        assert_eq!(IntegratorVariant::Verlet.scheme(), PhysicalScheme::Verlet);
        assert_eq!(IntegratorVariant::Verlet.rule(), ParameterRule::Inertial);
        assert_eq!(
            IntegratorVariant::HybridConstCharge { target: -1.0 }.rule(),
            ParameterRule::LangevinConserved(Conservation::charge(-1.0))
        );
        assert_eq!(IntegratorVariant::Hybrid.scheme(), PhysicalScheme::LangevinBaoab);
    }

    #[test]
    fn test_signal_count_must_match_ghosts() {
        let err = two_ghosts()
            .signals(vec![SignalRecord::default()])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            FlextopError::Config(ConfigError::GhostCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_hybrid_without_thermostat_rejected() {
        let err = two_ghosts()
            .variant(IntegratorVariant::Hybrid)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            FlextopError::Config(ConfigError::MissingThermostat(_))
        ));
    }

    #[test]
    fn test_phase_transitions() {
        let mut integrator = two_ghosts().build().unwrap();
        assert_eq!(integrator.phase(), IntegratorPhase::Constructed);

        integrator.step(0).unwrap();
        assert_eq!(integrator.phase(), IntegratorPhase::Constructed);
        assert_eq!(integrator.system().step, 0);

        integrator.step(3).unwrap();
        assert_eq!(integrator.phase(), IntegratorPhase::Stepping);
        assert_eq!(integrator.system().step, 3);
        assert!((integrator.system().time - 3.0 * integrator.dt()).abs() < 1e-15);

        integrator.finalize();
        assert!(matches!(integrator.step(1), Err(FlextopError::Finalized)));
        assert_eq!(integrator.system().step, 3);
    }

    #[test]
    fn test_step_streams_are_distinct_and_repeatable() {
        use rand::Rng;
        let draw = |stream, step| step_rng(5, stream, step).gen::<u64>();
        assert_eq!(draw(SIGNAL_STREAM, 3), draw(SIGNAL_STREAM, 3));
        assert_ne!(draw(SIGNAL_STREAM, 3), draw(PHYSICAL_STREAM, 3));
        assert_ne!(draw(SIGNAL_STREAM, 3), draw(SIGNAL_STREAM, 4));
        assert_ne!(
            step_rng(5, SIGNAL_STREAM, 0).gen::<u64>(),
            step_rng(6, SIGNAL_STREAM, 0).gen::<u64>()
        );
    }
}
