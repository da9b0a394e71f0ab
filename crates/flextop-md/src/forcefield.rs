//! Force terms and their evaluation into forces, grouped energies, and
//! signal-parameter derivatives.

use crate::{ParticleSystem, Result, Vec3};
use flextop_signal::{EnergyDerivatives, SignalKey, SignalStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A potential energy term.
///
/// A term reads positions and the current signal values and accumulates into
/// an [`Evaluation`]. Terms that depend on ghost signal parameters also write
/// `dE/dp` for every pair they report in [`ForceTerm::derivative_keys`].
pub trait ForceTerm: Send + Sync {
    fn name(&self) -> &str;

    /// Force group the energy is reported under.
    fn group(&self) -> u32 {
        0
    }

    /// Accumulate forces, energy, and derivatives at the current configuration.
    fn compute(&self, system: &ParticleSystem, signals: &SignalStore, out: &mut Evaluation);

    /// (ghost, parameter) pairs whose derivative this term writes.
    fn derivative_keys(&self, _n_ghosts: usize) -> Vec<SignalKey> {
        Vec::new()
    }

    /// Reject a system whose layout the term cannot be evaluated on.
    fn validate(&self, _system: &ParticleSystem) -> Result<()> {
        Ok(())
    }
}

/// Output of one force evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Force on every particle (kJ/mol/nm).
    pub forces: Vec<Vec3>,
    /// Potential energy per force group (kJ/mol).
    pub energies: BTreeMap<u32, f64>,
    /// `dE/dp` per ghost and parameter.
    pub derivatives: EnergyDerivatives,
}

impl Evaluation {
    pub fn new(n_particles: usize, n_ghosts: usize) -> Self {
        Self {
            forces: vec![Vec3::zeros(); n_particles],
            energies: BTreeMap::new(),
            derivatives: EnergyDerivatives::new(n_ghosts),
        }
    }

    /// Zero all accumulators, resizing to the given system.
    pub fn reset(&mut self, n_particles: usize, n_ghosts: usize) {
        self.forces.clear();
        self.forces.resize(n_particles, Vec3::zeros());
        self.energies.clear();
        if self.derivatives.n_ghosts() == n_ghosts {
            self.derivatives.clear();
        } else {
            self.derivatives = EnergyDerivatives::new(n_ghosts);
        }
    }

    #[inline]
    pub fn add_force(&mut self, i: usize, f: Vec3) {
        self.forces[i] += f;
    }

    pub fn add_energy(&mut self, group: u32, energy: f64) {
        *self.energies.entry(group).or_insert(0.0) += energy;
    }

    pub fn group_energy(&self, group: u32) -> f64 {
        self.energies.get(&group).copied().unwrap_or(0.0)
    }

    /// Total potential energy over all groups.
    pub fn potential_energy(&self) -> f64 {
        self.energies.values().sum()
    }
}

/// Ordered collection of force terms evaluated together.
#[derive(Clone, Default)]
pub struct ForceSet {
    terms: Vec<Arc<dyn ForceTerm>>,
}

impl ForceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, term: Arc<dyn ForceTerm>) {
        self.terms.push(term);
    }

    pub fn with_term(mut self, term: Arc<dyn ForceTerm>) -> Self {
        self.add(term);
        self
    }

    pub fn terms(&self) -> &[Arc<dyn ForceTerm>] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate every term into `out`, which is reset first.
    pub fn evaluate(&self, system: &ParticleSystem, signals: &SignalStore, out: &mut Evaluation) {
        out.reset(system.len(), system.n_ghosts());
        for term in &self.terms {
            // Every group is reported, even one whose energy is zero.
            out.energies.entry(term.group()).or_insert(0.0);
            term.compute(system, signals, out);
        }
    }

    /// Check every term against the system layout.
    pub fn validate(&self, system: &ParticleSystem) -> Result<()> {
        self.terms.iter().try_for_each(|t| t.validate(system))
    }

    /// Union of the derivative keys of all terms.
    pub fn covered_keys(&self, n_ghosts: usize) -> BTreeSet<SignalKey> {
        self.terms
            .iter()
            .flat_map(|t| t.derivative_keys(n_ghosts))
            .collect()
    }

    /// Pairs no term writes a derivative for, in ghost-major order.
    pub fn missing_derivatives(&self, n_ghosts: usize) -> Vec<SignalKey> {
        let covered = self.covered_keys(n_ghosts);
        SignalKey::all(n_ghosts)
            .filter(|k| !covered.contains(k))
            .collect()
    }
}

impl std::fmt::Debug for ForceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.terms.iter().map(|t| t.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Particle;
    use flextop_signal::{Bounds, Parameter, SignalRecord};

    /// Constant pull on lambda of every ghost and a uniform field on all particles.
    struct Field;

    impl ForceTerm for Field {
        fn name(&self) -> &str {
            "field"
        }

        fn group(&self) -> u32 {
            3
        }

        fn compute(&self, system: &ParticleSystem, _signals: &SignalStore, out: &mut Evaluation) {
            for i in 0..system.len() {
                out.add_force(i, Vec3::new(0.0, 0.0, -1.0));
            }
            for g in 0..system.n_ghosts() {
                out.derivatives.add(g, Parameter::Lambda, -2.0);
            }
            out.add_energy(self.group(), 1.5);
        }

        fn derivative_keys(&self, n_ghosts: usize) -> Vec<SignalKey> {
            (0..n_ghosts)
                .map(|g| SignalKey::new(g, Parameter::Lambda))
                .collect()
        }
    }

    fn setup() -> (ParticleSystem, SignalStore) {
        let mut system = ParticleSystem::new();
        system.add_particle(Particle::new(Vec3::zeros(), 12.0)).unwrap();
        system.add_ghost(Vec3::new(0.5, 0.0, 0.0), 10.0);
        system.add_ghost(Vec3::new(0.0, 0.5, 0.0), 10.0);
        let records = vec![SignalRecord::new(0.0, 0.1, 1.0, 0.5); 2];
        let store = SignalStore::new(&records, &Bounds::default()).unwrap();
        (system, store)
    }

    #[test]
    fn test_evaluate_accumulates_and_resets() {
        let (system, store) = setup();
        let forces = ForceSet::new()
            .with_term(Arc::new(Field))
            .with_term(Arc::new(Field));
        let mut eval = Evaluation::new(0, 0);

        for _ in 0..2 {
            forces.evaluate(&system, &store, &mut eval);
            assert_eq!(eval.forces.len(), 3);
            assert_eq!(eval.forces[2].z, -2.0);
            assert_eq!(eval.group_energy(3), 3.0);
            assert_eq!(eval.potential_energy(), 3.0);
            assert_eq!(eval.derivatives.energy_derivative(1, Parameter::Lambda), -4.0);
        }
    }

    #[test]
    fn test_missing_derivatives_lists_uncovered_pairs() {
        let forces = ForceSet::new().with_term(Arc::new(Field));
        let missing = forces.missing_derivatives(2);
        assert_eq!(missing.len(), 6);
        assert_eq!(missing[0], SignalKey::new(0, Parameter::Charge));
        assert!(!missing.contains(&SignalKey::new(1, Parameter::Lambda)));

        assert_eq!(ForceSet::new().missing_derivatives(2).len(), 8);
        assert!(forces.missing_derivatives(0).is_empty());
    }
}
