//! Dynamical signal parameters of ghost particles.
//!
//! Every ghost carries four non-bonded signal parameters (charge, sigma,
//! epsilon, lambda). This crate holds their state and advances it from the
//! energy derivatives supplied by the force evaluation:
//! - [`SignalStore`]: value and auxiliary velocity per (ghost, parameter)
//! - [`Bounds`] / [`Coefficients`]: clamping intervals and dynamics coefficients
//! - [`EnergyDerivatives`]: `dE/dp` for every tracked pair, written by force terms
//! - [`ParameterStepper`]: deterministic, inertial, and Langevin update rules
//! - [`Conservation`]: optional correction holding a summed parameter fixed
//!
//! # Example
//!
//! ```
//! use flextop_signal::{
//!     Bounds, Coefficients, EnergyDerivatives, Parameter, ParameterRule, ParameterStepper,
//!     PerParameter, SignalRecord, SignalStore,
//! };
//! use rand::SeedableRng;
//!
//! let bounds = Bounds::default();
//! let coefficients = Coefficients::new(PerParameter::splat(1.0)).unwrap();
//! let mut store = SignalStore::new(&[SignalRecord::new(0.0, 0.1, 1.0, 0.5)], &bounds).unwrap();
//!
//! // Energy decreases as lambda grows.
//! let mut derivatives = EnergyDerivatives::new(1);
//! derivatives.add(0, Parameter::Lambda, -10.0);
//!
//! let stepper =
//!     ParameterStepper::new(ParameterRule::Deterministic, bounds, coefficients, 0.001, 0.0)
//!         .unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! stepper.advance(&mut store, &derivatives, &mut rng).unwrap();
//!
//! assert!(store.value(0, Parameter::Lambda) > 0.5);
//! ```

pub mod bounds;
pub mod conservation;
pub mod derivative;
pub mod error;
pub mod parameter;
pub mod stepper;
pub mod store;

pub use bounds::{Bounds, Coefficients, Interval};
pub use conservation::{CONSERVATION_TOLERANCE, Conservation, CorrectionPolicy};
pub use derivative::EnergyDerivatives;
pub use error::{ConfigError, Result};
pub use parameter::{Parameter, PerParameter, SignalKey};
pub use stepper::{ParameterRule, ParameterStepper, StepSummary, VelocityOnClamp};
pub use store::{SignalRecord, SignalStore};
