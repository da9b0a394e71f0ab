//! Particle representation for molecular dynamics.

use crate::Vec3;

/// A single particle, real or ghost.
#[derive(Clone, Debug)]
pub struct Particle {
    /// Position (nm).
    pub x: Vec3,
    /// Velocity (nm/ps).
    pub v: Vec3,
    /// Force accumulator (kJ/mol/nm).
    pub f: Vec3,
    /// Mass (amu). Zero marks a particle that never moves.
    pub mass: f64,
}

impl Particle {
    /// Create a new particle at rest.
    pub fn new(x: Vec3, mass: f64) -> Self {
        Self {
            x,
            v: Vec3::zeros(),
            f: Vec3::zeros(),
            mass,
        }
    }

    /// Set the initial velocity.
    pub fn with_velocity(mut self, v: Vec3) -> Self {
        self.v = v;
        self
    }

    /// Inverse mass, zero for immobile particles.
    #[inline]
    pub fn inv_mass(&self) -> f64 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }

    /// Kinetic energy: 0.5 * m * v^2.
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.v.norm_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.x.iter().chain(self.v.iter()).all(|c| c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_creation() {
        let p = Particle::new(Vec3::new(1.0, 2.0, 3.0), 12.0);
        assert_eq!(p.x, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.v, Vec3::zeros());
        assert!((p.inv_mass() - 1.0 / 12.0).abs() < 1e-15);
    }

    #[test]
    fn test_kinetic_energy() {
        let p = Particle::new(Vec3::zeros(), 2.0).with_velocity(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.kinetic_energy() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_massless_particle_is_immobile() {
        let p = Particle::new(Vec3::zeros(), 0.0);
        assert_eq!(p.inv_mass(), 0.0);
    }

    #[test]
    fn test_finiteness() {
        let mut p = Particle::new(Vec3::zeros(), 1.0);
        assert!(p.is_finite());
        p.v.y = f64::NAN;
        assert!(!p.is_finite());
    }
}
