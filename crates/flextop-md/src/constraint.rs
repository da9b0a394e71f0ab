//! Holonomic constraint projection: SHAKE on positions, RATTLE on velocities.

use crate::{MdError, Particle, Result, Vec3};

/// Projection of positions and velocities back onto the constraint manifold.
pub trait Constraints: Send + Sync {
    /// Number of scalar constraints (removed degrees of freedom).
    fn count(&self) -> usize;

    /// Project positions. `reference` holds the positions before the
    /// unconstrained update, one per particle.
    fn constrain_positions(&self, particles: &mut [Particle], reference: &[Vec3]) -> Result<()>;

    /// Remove velocity components along the constraints.
    fn constrain_velocities(&self, particles: &mut [Particle]) -> Result<()>;

    /// Check the constraints against a system of `n_particles`.
    fn validate(&self, _n_particles: usize) -> Result<()> {
        Ok(())
    }
}

/// No constraints; both projections are no-ops.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unconstrained;

impl Constraints for Unconstrained {
    fn count(&self) -> usize {
        0
    }

    fn constrain_positions(&self, _particles: &mut [Particle], _reference: &[Vec3]) -> Result<()> {
        Ok(())
    }

    fn constrain_velocities(&self, _particles: &mut [Particle]) -> Result<()> {
        Ok(())
    }
}

/// Fixed distance between two particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceConstraint {
    pub i: usize,
    pub j: usize,
    /// Target distance (nm).
    pub length: f64,
}

/// Iterative pairwise distance constraints.
#[derive(Clone, Debug)]
pub struct DistanceConstraints {
    constraints: Vec<DistanceConstraint>,
    /// Relative tolerance on each constrained distance.
    pub tolerance: f64,
    /// Sweeps before the solve is declared failed.
    pub max_iterations: usize,
}

impl DistanceConstraints {
    pub fn new(constraints: Vec<DistanceConstraint>) -> Self {
        Self {
            constraints,
            tolerance: 1e-10,
            max_iterations: 500,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }
}

impl Constraints for DistanceConstraints {
    fn count(&self) -> usize {
        self.constraints.len()
    }

    fn constrain_positions(&self, particles: &mut [Particle], reference: &[Vec3]) -> Result<()> {
        let mut residual = 0.0;
        for iteration in 0..self.max_iterations {
            residual = 0.0;
            for c in &self.constraints {
                let (inv_i, inv_j) = (particles[c.i].inv_mass(), particles[c.j].inv_mass());
                if inv_i + inv_j == 0.0 {
                    continue;
                }
                let r = particles[c.i].x - particles[c.j].x;
                let d2 = c.length * c.length;
                let diff = d2 - r.norm_squared();
                let error = diff.abs() / (2.0 * d2);
                residual = f64::max(residual, error);
                if error <= self.tolerance {
                    continue;
                }

                let r_ref = reference[c.i] - reference[c.j];
                let denom = 2.0 * (inv_i + inv_j) * r_ref.dot(&r);
                if denom.abs() < f64::EPSILON * d2 {
                    return Err(MdError::ConstraintFailure {
                        stage: "position",
                        iterations: 0,
                        residual: error,
                    });
                }
                let g = diff / denom;
                particles[c.i].x += g * inv_i * r_ref;
                particles[c.j].x -= g * inv_j * r_ref;
            }
            if residual <= self.tolerance {
                log::trace!("SHAKE converged after {} iterations", iteration + 1);
                return Ok(());
            }
        }

        Err(MdError::ConstraintFailure {
            stage: "position",
            iterations: self.max_iterations,
            residual,
        })
    }

    fn constrain_velocities(&self, particles: &mut [Particle]) -> Result<()> {
        let mut residual = 0.0;
        for _ in 0..self.max_iterations {
            residual = 0.0;
            for c in &self.constraints {
                let (inv_i, inv_j) = (particles[c.i].inv_mass(), particles[c.j].inv_mass());
                if inv_i + inv_j == 0.0 {
                    continue;
                }
                let r = particles[c.i].x - particles[c.j].x;
                let r2 = r.norm_squared();
                let rv = r.dot(&(particles[c.i].v - particles[c.j].v));
                let error = rv.abs() / (c.length * c.length);
                residual = f64::max(residual, error);
                if error <= self.tolerance {
                    continue;
                }

                let k = rv / ((inv_i + inv_j) * r2);
                particles[c.i].v -= k * inv_i * r;
                particles[c.j].v += k * inv_j * r;
            }
            if residual <= self.tolerance {
                return Ok(());
            }
        }

        Err(MdError::ConstraintFailure {
            stage: "velocity",
            iterations: self.max_iterations,
            residual,
        })
    }

    fn validate(&self, n_particles: usize) -> Result<()> {
        for c in &self.constraints {
            let reason = if c.i == c.j {
                Some("particle constrained to itself")
            } else if c.i >= n_particles || c.j >= n_particles {
                Some("index out of range")
            } else if !(c.length.is_finite() && c.length > 0.0) {
                Some("length must be positive")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(MdError::InvalidConstraint {
                    i: c.i,
                    j: c.j,
                    reason,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Bent triatomic with two fixed bonds to particle 0.
    fn triatomic() -> (Vec<Particle>, DistanceConstraints) {
        let particles = vec![
            Particle::new(Vec3::zeros(), 16.0),
            Particle::new(Vec3::new(0.1, 0.0, 0.0), 1.0),
            Particle::new(Vec3::new(-0.03, 0.095, 0.0), 1.0),
        ];
        let constraints = DistanceConstraints::new(vec![
            DistanceConstraint { i: 0, j: 1, length: 0.1 },
            DistanceConstraint { i: 0, j: 2, length: 0.1 },
        ]);
        (particles, constraints)
    }

    #[test]
    fn test_shake_restores_bond_lengths() {
        let (mut particles, constraints) = triatomic();
        let reference: Vec<Vec3> = particles.iter().map(|p| p.x).collect();

        particles[1].x += Vec3::new(0.004, 0.002, 0.0);
        particles[2].x += Vec3::new(-0.003, 0.001, 0.001);
        constraints.constrain_positions(&mut particles, &reference).unwrap();

        for c in constraints.constraints() {
            let d = (particles[c.i].x - particles[c.j].x).norm();
            assert_relative_eq!(d, c.length, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rattle_removes_bond_velocity() {
        let (mut particles, constraints) = triatomic();
        particles[1].v = Vec3::new(1.0, 0.5, 0.0);
        particles[2].v = Vec3::new(0.2, -0.7, 0.3);
        constraints.constrain_velocities(&mut particles).unwrap();

        for c in constraints.constraints() {
            let r = particles[c.i].x - particles[c.j].x;
            let dv = particles[c.i].v - particles[c.j].v;
            assert!(r.dot(&dv).abs() < 1e-10);
        }
    }

    #[test]
    fn test_rattle_preserves_momentum() {
        let (mut particles, constraints) = triatomic();
        particles[1].v = Vec3::new(1.0, 0.5, 0.0);
        let before: Vec3 = particles.iter().map(|p| p.mass * p.v).sum();
        constraints.constrain_velocities(&mut particles).unwrap();
        let after: Vec3 = particles.iter().map(|p| p.mass * p.v).sum();
        assert!((after - before).norm() < 1e-10);
    }

    #[test]
    fn test_unreachable_tolerance_reports_failure() {
        let (mut particles, constraints) = triatomic();
        let constraints = DistanceConstraints {
            max_iterations: 1,
            ..constraints.with_tolerance(0.0)
        };
        let reference: Vec<Vec3> = particles.iter().map(|p| p.x).collect();
        particles[1].x += Vec3::new(0.05, 0.0, 0.0);
        let err = constraints
            .constrain_positions(&mut particles, &reference)
            .unwrap_err();
        assert!(matches!(err, MdError::ConstraintFailure { stage: "position", .. }));
    }

    #[test]
    fn test_validate_rejects_bad_constraints() {
        let c = DistanceConstraints::new(vec![DistanceConstraint { i: 0, j: 5, length: 0.1 }]);
        assert!(matches!(c.validate(3), Err(MdError::InvalidConstraint { j: 5, .. })));

        let c = DistanceConstraints::new(vec![DistanceConstraint { i: 1, j: 1, length: 0.1 }]);
        assert!(c.validate(3).is_err());

        let (_, good) = triatomic();
        assert!(good.validate(3).is_ok());
    }
}
