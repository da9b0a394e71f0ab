//! Particle system: real particles first, ghost particles appended after them.

use crate::{MdError, Particle, Result, Vec3};
use rand::Rng;
use rand_distr::StandardNormal;
use std::ops::Range;

/// Boltzmann constant (kJ/mol/K).
pub const BOLTZMANN: f64 = 0.008314463;

/// Default mass of a ghost particle (amu).
pub const GHOST_MASS: f64 = 10.0;

/// Particles of one simulation. Ghost `g` lives at index `n_real + g`; the
/// layout is fixed once the first ghost is added.
#[derive(Clone, Debug, Default)]
pub struct ParticleSystem {
    /// All particles, real then ghost.
    pub particles: Vec<Particle>,
    n_real: usize,
    /// Periodic box size (None = no PBC).
    pub box_size: Option<Vec3>,
    /// Current simulation time (ps).
    pub time: f64,
    /// Completed steps.
    pub step: u64,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a real particle. Fails once ghosts are present.
    pub fn add_particle(&mut self, particle: Particle) -> Result<usize> {
        if self.n_ghosts() > 0 {
            return Err(MdError::ParticleOrder {
                n_ghosts: self.n_ghosts(),
            });
        }
        self.particles.push(particle);
        self.n_real += 1;
        Ok(self.n_real - 1)
    }

    /// Append a ghost particle and return its ghost index.
    pub fn add_ghost(&mut self, x: Vec3, mass: f64) -> usize {
        self.particles.push(Particle::new(x, mass));
        self.n_ghosts() - 1
    }

    /// Set periodic boundary conditions.
    pub fn set_box_size(&mut self, box_size: Vec3) {
        self.box_size = Some(box_size);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn n_real(&self) -> usize {
        self.n_real
    }

    pub fn n_ghosts(&self) -> usize {
        self.particles.len() - self.n_real
    }

    /// Particle index of ghost `g`.
    #[inline]
    pub fn ghost_index(&self, g: usize) -> usize {
        self.n_real + g
    }

    pub fn ghost_range(&self) -> Range<usize> {
        self.n_real..self.particles.len()
    }

    pub fn ghost(&self, g: usize) -> &Particle {
        &self.particles[self.n_real + g]
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.x).collect()
    }

    pub fn velocities(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.v).collect()
    }

    /// Replace every force accumulator with `forces`.
    pub fn load_forces(&mut self, forces: &[Vec3]) -> Result<()> {
        if forces.len() != self.particles.len() {
            return Err(MdError::ForceCount {
                expected: self.particles.len(),
                actual: forces.len(),
            });
        }
        for (p, f) in self.particles.iter_mut().zip(forces) {
            p.f = *f;
        }
        Ok(())
    }

    /// Initialize velocities from the Maxwell-Boltzmann distribution at
    /// `temperature` (K), then remove center-of-mass motion.
    pub fn initialize_velocities<R: Rng + ?Sized>(&mut self, temperature: f64, rng: &mut R) {
        for particle in &mut self.particles {
            if particle.mass <= 0.0 {
                continue;
            }
            let sigma = (BOLTZMANN * temperature / particle.mass).sqrt();
            for d in 0..3 {
                let z: f64 = rng.sample(StandardNormal);
                particle.v[d] = sigma * z;
            }
        }

        self.remove_com_motion();
    }

    /// Remove center-of-mass motion.
    pub fn remove_com_motion(&mut self) {
        let mut total_momentum = Vec3::zeros();
        let mut total_mass = 0.0;

        for particle in &self.particles {
            total_momentum += particle.mass * particle.v;
            total_mass += particle.mass;
        }
        if total_mass <= 0.0 {
            return;
        }

        let com_velocity = total_momentum / total_mass;

        for particle in self.particles.iter_mut().filter(|p| p.mass > 0.0) {
            particle.v -= com_velocity;
        }
    }

    /// Compute total kinetic energy.
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    /// Instantaneous temperature (K) with `n_constraints` removed degrees of freedom.
    pub fn temperature(&self, n_constraints: usize) -> f64 {
        let n_mobile = self.particles.iter().filter(|p| p.mass > 0.0).count();
        let n_dof = (3 * n_mobile).saturating_sub(n_constraints);
        if n_dof == 0 {
            return 0.0;
        }
        2.0 * self.kinetic_energy() / (n_dof as f64 * BOLTZMANN)
    }

    /// Every position and velocity is finite.
    pub fn is_finite(&self) -> bool {
        self.particles.iter().all(Particle::is_finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn system_with_ghosts() -> ParticleSystem {
        let mut system = ParticleSystem::new();
        for i in 0..4 {
            system
                .add_particle(Particle::new(Vec3::new(i as f64 * 0.3, 0.0, 0.0), 12.0))
                .unwrap();
        }
        system.add_ghost(Vec3::new(0.0, 1.0, 0.0), GHOST_MASS);
        system.add_ghost(Vec3::new(0.0, 2.0, 0.0), GHOST_MASS);
        system
    }

    #[test]
    fn test_ghosts_follow_real_particles() {
        let system = system_with_ghosts();
        assert_eq!(system.n_real(), 4);
        assert_eq!(system.n_ghosts(), 2);
        assert_eq!(system.ghost_index(1), 5);
        assert_eq!(system.ghost_range(), 4..6);
        assert_eq!(system.ghost(1).x, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_real_particle_after_ghost_rejected() {
        let mut system = system_with_ghosts();
        let err = system
            .add_particle(Particle::new(Vec3::zeros(), 1.0))
            .unwrap_err();
        assert_eq!(err, MdError::ParticleOrder { n_ghosts: 2 });
    }

    #[test]
    fn test_load_forces_checks_length() {
        let mut system = system_with_ghosts();
        assert!(system.load_forces(&[Vec3::zeros(); 3]).is_err());
        system.load_forces(&[Vec3::new(1.0, 0.0, 0.0); 6]).unwrap();
        assert_eq!(system.particles[5].f.x, 1.0);
    }

    #[test]
    fn test_initialize_velocities_removes_drift() {
        let mut system = ParticleSystem::new();
        for i in 0..200 {
            system
                .add_particle(Particle::new(Vec3::new(i as f64, 0.0, 0.0), 39.948))
                .unwrap();
        }
        let mut rng = StdRng::seed_from_u64(4);
        system.initialize_velocities(300.0, &mut rng);

        let momentum: Vec3 = system.particles.iter().map(|p| p.mass * p.v).sum();
        assert!(momentum.norm() < 1e-9);

        let temp = system.temperature(0);
        assert!(
            (temp - 300.0).abs() / 300.0 < 0.2,
            "Temperature: {:.1} K (target: 300 K)",
            temp
        );
    }
}
