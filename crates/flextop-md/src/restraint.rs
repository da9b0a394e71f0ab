//! Restraint terms: spatial confinement of ghosts and a harmonic pull of their
//! signal parameters toward a target.

use crate::periodic::displacement;
use crate::{Evaluation, ForceTerm, MdError, ParticleSystem, Result, Vec3};
use flextop_signal::{Parameter, PerParameter, SignalKey, SignalStore};

/// Flat-bottom harmonic restraint between each ghost and the mass-weighted
/// centroid of an anchor group: `E = 0.5*k*(d - d0)^2` for `d > d0`, else 0.
#[derive(Clone, Debug)]
pub struct FlatBottomRestraint {
    anchors: Vec<usize>,
    /// Force constant (kJ/mol/nm^2).
    pub k: f64,
    /// Flat-bottom radius (nm).
    pub d0: f64,
    group: u32,
}

impl FlatBottomRestraint {
    pub fn new(anchors: Vec<usize>, k: f64, d0: f64) -> Self {
        Self {
            anchors,
            k,
            d0,
            group: 1,
        }
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    /// Anchor centroid and the weight of each anchor in it.
    fn centroid(&self, system: &ParticleSystem) -> Option<(Vec3, Vec<f64>)> {
        let first = *self.anchors.first()?;
        let origin = system.particles[first].x;

        let masses: Vec<f64> = self
            .anchors
            .iter()
            .map(|&a| system.particles[a].mass.max(0.0))
            .collect();
        let total: f64 = masses.iter().sum();
        let weights: Vec<f64> = if total > 0.0 {
            masses.iter().map(|m| m / total).collect()
        } else {
            vec![1.0 / self.anchors.len() as f64; self.anchors.len()]
        };

        // Unwrap the group around its first anchor before averaging.
        let offset: Vec3 = self
            .anchors
            .iter()
            .zip(&weights)
            .map(|(&a, &w)| w * displacement(origin, system.particles[a].x, system.box_size))
            .sum();
        Some((origin + offset, weights))
    }
}

impl ForceTerm for FlatBottomRestraint {
    fn name(&self) -> &str {
        "flat_bottom_restraint"
    }

    fn group(&self) -> u32 {
        self.group
    }

    fn validate(&self, system: &ParticleSystem) -> Result<()> {
        let invalid = |reason: String| MdError::InvalidTerm {
            term: self.name().to_string(),
            reason,
        };
        if self.anchors.is_empty() {
            return Err(invalid("anchor group is empty".to_string()));
        }
        if let Some(&a) = self.anchors.iter().find(|&&a| a >= system.n_real()) {
            return Err(invalid(format!(
                "anchor {a} is not one of the {} real particles",
                system.n_real()
            )));
        }
        Ok(())
    }

    fn compute(&self, system: &ParticleSystem, _signals: &SignalStore, out: &mut Evaluation) {
        let Some((center, weights)) = self.centroid(system) else {
            return;
        };

        let mut energy = 0.0;
        for gi in system.ghost_range() {
            let dr = displacement(center, system.particles[gi].x, system.box_size);
            let d = dr.norm();
            if d <= self.d0 {
                continue;
            }
            let stretch = d - self.d0;
            energy += 0.5 * self.k * stretch * stretch;

            let f = -self.k * stretch * dr / d;
            out.add_force(gi, f);
            for (&a, &w) in self.anchors.iter().zip(&weights) {
                out.add_force(a, -w * f);
            }
        }
        out.add_energy(self.group, energy);
    }
}

/// Harmonic pull of ghost signal parameters toward per-ghost targets:
/// `E = sum_p 0.5*w_p*(p_g - target_{g,p})^2`.
///
/// Ghosts beyond the target list are left untouched.
#[derive(Clone, Debug)]
pub struct SignalRestraint {
    targets: Vec<PerParameter<f64>>,
    /// Weight per parameter; zero disables the pull on that parameter.
    pub weights: PerParameter<f64>,
    group: u32,
}

impl SignalRestraint {
    pub fn new(targets: Vec<PerParameter<f64>>, weights: PerParameter<f64>) -> Self {
        Self {
            targets,
            weights,
            group: 2,
        }
    }

    /// The same target for `n_ghosts` ghosts.
    pub fn uniform(target: PerParameter<f64>, n_ghosts: usize, weights: PerParameter<f64>) -> Self {
        Self::new(vec![target; n_ghosts], weights)
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    pub fn targets(&self) -> &[PerParameter<f64>] {
        &self.targets
    }
}

impl ForceTerm for SignalRestraint {
    fn name(&self) -> &str {
        "signal_restraint"
    }

    fn group(&self) -> u32 {
        self.group
    }

    fn compute(&self, system: &ParticleSystem, signals: &SignalStore, out: &mut Evaluation) {
        let n = system.n_ghosts().min(signals.n_ghosts()).min(self.targets.len());
        let mut energy = 0.0;
        for (g, target) in self.targets[..n].iter().enumerate() {
            for p in Parameter::ALL {
                let w = self.weights[p];
                if w == 0.0 {
                    continue;
                }
                let delta = signals.value(g, p) - target[p];
                energy += 0.5 * w * delta * delta;
                out.derivatives.add(g, p, w * delta);
            }
        }
        out.add_energy(self.group, energy);
    }

    fn derivative_keys(&self, n_ghosts: usize) -> Vec<SignalKey> {
        SignalKey::all(n_ghosts.min(self.targets.len()))
            .filter(|k| self.weights[k.parameter] != 0.0)
            .collect()
    }
}
