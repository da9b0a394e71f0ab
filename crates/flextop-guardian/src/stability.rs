//! Post-step finiteness audit.
//!
//! Nothing inside a step checks for NaN/Inf; a non-finite value propagates
//! until the caller audits the state. Once found, continuing only compounds
//! the divergence.

use flextop_md::ParticleSystem;
use flextop_signal::{Parameter, SignalKey, SignalStore};
use thiserror::Error;

/// First non-finite quantity found in the simulation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Instability {
    #[error("non-finite position of particle {particle}")]
    Position { particle: usize },

    #[error("non-finite velocity of particle {particle}")]
    Velocity { particle: usize },

    #[error("non-finite value of {0}")]
    SignalValue(SignalKey),

    #[error("non-finite velocity of {0}")]
    SignalVelocity(SignalKey),
}

/// Scan positions, velocities, and signal state in index order.
pub fn audit(system: &ParticleSystem, store: &SignalStore) -> Option<Instability> {
    if system.is_finite() && store.is_finite() {
        return None;
    }

    for (i, p) in system.particles.iter().enumerate() {
        if !p.x.iter().all(|c| c.is_finite()) {
            return Some(Instability::Position { particle: i });
        }
        if !p.v.iter().all(|c| c.is_finite()) {
            return Some(Instability::Velocity { particle: i });
        }
    }

    for g in 0..store.n_ghosts() {
        for p in Parameter::ALL {
            let key = SignalKey::new(g, p);
            if !store.value(g, p).is_finite() {
                return Some(Instability::SignalValue(key));
            }
            if !store.velocity(g, p).is_finite() {
                return Some(Instability::SignalVelocity(key));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextop_md::{Particle, Vec3};
    use flextop_signal::{Bounds, SignalRecord};

    fn setup() -> (ParticleSystem, SignalStore) {
        let mut system = ParticleSystem::new();
        system.add_particle(Particle::new(Vec3::zeros(), 12.0)).unwrap();
        system.add_ghost(Vec3::new(0.5, 0.0, 0.0), 10.0);
        let store =
            SignalStore::new(&[SignalRecord::new(0.0, 0.1, 1.0, 0.5)], &Bounds::default()).unwrap();
        (system, store)
    }

    #[test]
    fn test_finite_state_passes() {
        let (system, store) = setup();
        assert_eq!(audit(&system, &store), None);
    }

    #[test]
    fn test_reports_first_bad_particle() {
        let (mut system, store) = setup();
        system.particles[1].v.z = f64::INFINITY;
        assert_eq!(audit(&system, &store), Some(Instability::Velocity { particle: 1 }));

        system.particles[0].x.x = f64::NAN;
        assert_eq!(audit(&system, &store), Some(Instability::Position { particle: 0 }));
    }

    #[test]
    fn test_reports_bad_signal() {
        let (system, mut store) = setup();
        store.set_velocity(0, Parameter::Sigma, f64::NAN);
        let found = audit(&system, &store);
        assert_eq!(
            found,
            Some(Instability::SignalVelocity(SignalKey::new(0, Parameter::Sigma)))
        );
        assert_eq!(
            found.map(|e| e.to_string()).as_deref(),
            Some("non-finite velocity of sigma_g0")
        );
    }
}
