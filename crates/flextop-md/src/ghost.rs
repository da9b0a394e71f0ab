//! Ghost-to-system non-bonded coupling with signal-parameter derivatives.
//!
//! For every ghost `g` and real particle `i` within the cutoff:
//!
//! ```text
//! E = lambda_g * (4*eps*((s/r)^12 - (s/r)^6) + K*q_i*q_g/r)
//! s = (sigma_i + sigma_g)/2,  eps = sqrt(epsilon_i*epsilon_g)
//! ```
//!
//! with `K = 138.9417` kJ nm/(mol e^2). Ghost-ghost pairs do not interact.

use crate::periodic::displacement;
use crate::{Evaluation, ForceTerm, ParticleSystem, Vec3};
use flextop_signal::{Parameter, PerParameter, SignalKey, SignalStore};
use serde::{Deserialize, Serialize};

/// Coulomb prefactor (kJ nm/(mol e^2)).
pub const COULOMB: f64 = 138.9417;

/// Fixed non-bonded parameters of a real particle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtomParameters {
    /// Partial charge (e).
    pub charge: f64,
    /// LJ diameter (nm).
    pub sigma: f64,
    /// LJ well depth (kJ/mol).
    pub epsilon: f64,
}

impl AtomParameters {
    pub fn new(charge: f64, sigma: f64, epsilon: f64) -> Self {
        Self {
            charge,
            sigma,
            epsilon,
        }
    }
}

/// Lambda-scaled LJ + Coulomb between each ghost and the real particles.
#[derive(Clone, Debug)]
pub struct GhostNonbonded {
    /// One entry per real particle, in particle order.
    atoms: Vec<AtomParameters>,
    /// Cutoff radius (nm).
    pub cutoff: f64,
    group: u32,
}

impl GhostNonbonded {
    pub fn new(atoms: Vec<AtomParameters>, cutoff: f64) -> Self {
        Self {
            atoms,
            cutoff,
            group: 0,
        }
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    pub fn atoms(&self) -> &[AtomParameters] {
        &self.atoms
    }
}

impl ForceTerm for GhostNonbonded {
    fn name(&self) -> &str {
        "ghost_nonbonded"
    }

    fn group(&self) -> u32 {
        self.group
    }

    fn compute(&self, system: &ParticleSystem, signals: &SignalStore, out: &mut Evaluation) {
        let rc2 = self.cutoff * self.cutoff;
        let n_real = system.n_real().min(self.atoms.len());
        let mut energy = 0.0;

        for g in 0..system.n_ghosts() {
            let gi = system.ghost_index(g);
            let x_g = system.particles[gi].x;
            let p = signals.values(g);
            let (q_g, sigma_g, epsilon_g, lambda_g) = (
                p[Parameter::Charge],
                p[Parameter::Sigma],
                p[Parameter::Epsilon],
                p[Parameter::Lambda],
            );

            let mut d_energy = PerParameter::splat(0.0);
            let mut f_ghost = Vec3::zeros();

            for (i, atom) in self.atoms[..n_real].iter().enumerate() {
                let dr = displacement(x_g, system.particles[i].x, system.box_size);
                let r2 = dr.norm_squared();
                if r2 > rc2 || r2 < 1e-20 {
                    continue;
                }
                let r = r2.sqrt();

                let s = 0.5 * (atom.sigma + sigma_g);
                let eps = (atom.epsilon * epsilon_g).sqrt();
                let sr6 = (s / r).powi(6);
                let sr12 = sr6 * sr6;

                let lj = 4.0 * eps * (sr12 - sr6);
                let coulomb = COULOMB * atom.charge * q_g / r;
                energy += lambda_g * (lj + coulomb);

                // dE/dr; positive means the ghost is pulled toward i.
                let de_dr = lambda_g * (24.0 * eps * (sr6 - 2.0 * sr12) - coulomb) / r;
                let f = de_dr * dr / r;
                f_ghost += f;
                out.add_force(i, -f);

                d_energy[Parameter::Lambda] += lj + coulomb;
                d_energy[Parameter::Charge] += lambda_g * COULOMB * atom.charge / r;
                d_energy[Parameter::Sigma] +=
                    lambda_g * 4.0 * eps * (12.0 * sr12 - 6.0 * sr6) / s * 0.5;
                if epsilon_g > 0.0 {
                    d_energy[Parameter::Epsilon] +=
                        lambda_g * 4.0 * (sr12 - sr6) * 0.5 * eps / epsilon_g;
                }
            }

            out.add_force(gi, f_ghost);
            for (param, d) in d_energy.iter() {
                out.derivatives.add(g, param, *d);
            }
        }

        out.add_energy(self.group, energy);
    }

    fn derivative_keys(&self, n_ghosts: usize) -> Vec<SignalKey> {
        SignalKey::all(n_ghosts).collect()
    }
}
