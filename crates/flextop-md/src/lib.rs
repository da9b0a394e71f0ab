//! Spatial molecular dynamics for systems with ghost particles.
//!
//! Provides the physical half of the coupled integrator:
//! - [`ParticleSystem`]: real particles followed by ghost particles
//! - [`ForceTerm`] / [`ForceSet`]: force evaluation that also reports
//!   energy derivatives with respect to ghost signal parameters
//! - [`GhostNonbonded`], [`FlatBottomRestraint`], [`SignalRestraint`]:
//!   reference force terms
//! - [`Constraints`]: SHAKE/RATTLE distance constraints
//! - [`PhysicalStepper`]: leapfrog, velocity Verlet, and Langevin BAOAB
//!
//! # Example
//!
//! ```
//! use flextop_md::{
//!     AtomParameters, Evaluation, ForceSet, GhostNonbonded, Particle, ParticleSystem,
//!     PhysicalScheme, PhysicalStepper, Unconstrained, Vec3, GHOST_MASS,
//! };
//! use flextop_signal::{Bounds, SignalRecord, SignalStore};
//! use rand::SeedableRng;
//! use std::sync::Arc;
//!
//! let mut system = ParticleSystem::new();
//! system.add_particle(Particle::new(Vec3::zeros(), 12.0)).unwrap();
//! system.add_ghost(Vec3::new(0.4, 0.0, 0.0), GHOST_MASS);
//!
//! let signals =
//!     SignalStore::new(&[SignalRecord::new(0.5, 0.2, 1.0, 1.0)], &Bounds::default()).unwrap();
//! let forces = ForceSet::new().with_term(Arc::new(GhostNonbonded::new(
//!     vec![AtomParameters::new(-0.5, 0.3, 0.5)],
//!     1.0,
//! )));
//!
//! let mut stepper =
//!     PhysicalStepper::new(PhysicalScheme::Leapfrog, 0.002, None, Arc::new(Unconstrained)).unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let mut eval = Evaluation::new(system.len(), system.n_ghosts());
//!
//! for _ in 0..10 {
//!     forces.evaluate(&system, &signals, &mut eval);
//!     system.load_forces(&eval.forces).unwrap();
//!     stepper.advance(&mut system, &mut rng).unwrap();
//! }
//! // Opposite charges attract.
//! assert!(system.ghost(0).x.x < 0.4);
//! ```

pub mod constraint;
pub mod error;
pub mod forcefield;
pub mod ghost;
pub mod particle;
pub mod periodic;
pub mod restraint;
pub mod stepper;
pub mod system;

/// 3D vector (nm, nm/ps, kJ/mol/nm depending on context).
pub type Vec3 = nalgebra::Vector3<f64>;

pub use constraint::{Constraints, DistanceConstraint, DistanceConstraints, Unconstrained};
pub use error::{MdError, Result};
pub use forcefield::{Evaluation, ForceSet, ForceTerm};
pub use ghost::{AtomParameters, COULOMB, GhostNonbonded};
pub use particle::Particle;
pub use periodic::{displacement, minimum_image};
pub use restraint::{FlatBottomRestraint, SignalRestraint};
pub use stepper::{PhysicalScheme, PhysicalStepper, Thermostat};
pub use system::{BOLTZMANN, GHOST_MASS, ParticleSystem};
