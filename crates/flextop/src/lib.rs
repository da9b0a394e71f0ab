//! flextop: molecular dynamics with flexible-topology ghost particles.
//!
//! This is the umbrella crate that provides the [`HybridIntegrator`] and
//! re-exports core types from sub-crates. Ghost particles carry charge,
//! sigma, epsilon, and lambda as dynamical variables advanced alongside
//! their coordinates, so an assembly of ghosts can morph toward a target
//! molecule.
//!
//! # Example
//!
//! ```
//! use flextop::{
//!     IntegratorBuilder, IntegratorVariant, ParticleSystem, PerParameter, SignalRecord,
//!     SignalRestraint, Vec3,
//! };
//! use std::sync::Arc;
//!
//! let mut system = ParticleSystem::new();
//! system.add_ghost(Vec3::zeros(), 10.0);
//! let restraint = SignalRestraint::uniform(
//!     PerParameter::new(0.5, 0.2, 1.0, 1.0),
//!     1,
//!     PerParameter::splat(10.0),
//! );
//!
//! let mut integrator = IntegratorBuilder::new(system)
//!     .variant(IntegratorVariant::Leapfrog)
//!     .signals(vec![SignalRecord::new(0.0, 0.2, 1.0, 0.5)])
//!     .force(Arc::new(restraint))
//!     .build()
//!     .unwrap();
//! integrator.step(10).unwrap();
//! assert_eq!(integrator.system().step, 10);
//! ```

pub mod error;
pub mod integrator;
pub mod reporter;
pub mod simulation;

pub use error::{FlextopError, Result};
pub use integrator::{HybridIntegrator, IntegratorBuilder, IntegratorPhase, IntegratorVariant};
pub use reporter::{LogReporter, Reporter, SignalRecorder, Snapshot};
pub use simulation::Simulation;

pub use flextop_format::{self, IntegratorConfig, SignalCheckpoint};
pub use flextop_guardian::{self, ConservationMonitor, Instability, SignalHealth};
pub use flextop_md::{
    self, AtomParameters, Constraints, DistanceConstraint, DistanceConstraints, Evaluation,
    FlatBottomRestraint, ForceSet, ForceTerm, GhostNonbonded, Particle, ParticleSystem,
    PhysicalScheme, SignalRestraint, Thermostat, Vec3,
};
pub use flextop_signal::{
    self, Bounds, Coefficients, Conservation, CorrectionPolicy, EnergyDerivatives, Parameter,
    ParameterRule, PerParameter, SignalKey, SignalRecord, SignalStore, VelocityOnClamp,
};
