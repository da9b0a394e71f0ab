//! Signal parameter names and fixed-size per-parameter tables.

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One of the four non-bonded signal parameters carried by every ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    /// Partial charge (e).
    Charge,
    /// Lennard-Jones sigma (nm).
    Sigma,
    /// Lennard-Jones well depth (kJ/mol).
    Epsilon,
    /// Alchemical coupling strength in [0, 1].
    Lambda,
}

impl Parameter {
    /// All parameters in enumeration order. Noise draws follow this order.
    pub const ALL: [Parameter; 4] = [
        Parameter::Charge,
        Parameter::Sigma,
        Parameter::Epsilon,
        Parameter::Lambda,
    ];

    pub const COUNT: usize = 4;

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Parameter::Charge => 0,
            Parameter::Sigma => 1,
            Parameter::Epsilon => 2,
            Parameter::Lambda => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Charge => "charge",
            Parameter::Sigma => "sigma",
            Parameter::Epsilon => "epsilon",
            Parameter::Lambda => "lambda",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "charge" => Ok(Parameter::Charge),
            "sigma" => Ok(Parameter::Sigma),
            "epsilon" => Ok(Parameter::Epsilon),
            "lambda" => Ok(Parameter::Lambda),
            other => Err(ConfigError::UnknownParameter(other.to_string())),
        }
    }
}

/// Dense table holding one `T` per [`Parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerParameter<T>([T; Parameter::COUNT]);

impl<T> PerParameter<T> {
    pub fn new(charge: T, sigma: T, epsilon: T, lambda: T) -> Self {
        Self([charge, sigma, epsilon, lambda])
    }

    pub fn from_fn(mut f: impl FnMut(Parameter) -> T) -> Self {
        Self(Parameter::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &T)> {
        Parameter::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PerParameter<U> {
        PerParameter(self.0.map(f))
    }
}

impl<T: Copy> PerParameter<T> {
    pub fn splat(value: T) -> Self {
        Self([value; Parameter::COUNT])
    }
}

impl<T> Index<Parameter> for PerParameter<T> {
    type Output = T;

    #[inline]
    fn index(&self, p: Parameter) -> &T {
        &self.0[p.index()]
    }
}

impl<T> IndexMut<Parameter> for PerParameter<T> {
    #[inline]
    fn index_mut(&mut self, p: Parameter) -> &mut T {
        &mut self.0[p.index()]
    }
}

/// Stable address of one tracked (ghost, parameter) pair.
///
/// Renders as `<parameter>_g<ghost>`, e.g. `charge_g3`, the global-parameter
/// naming used by engines that key energy derivatives by string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalKey {
    pub ghost: usize,
    pub parameter: Parameter,
}

impl SignalKey {
    pub fn new(ghost: usize, parameter: Parameter) -> Self {
        Self { ghost, parameter }
    }

    /// Every key for `n_ghosts` ghosts, ghost-major.
    pub fn all(n_ghosts: usize) -> impl Iterator<Item = SignalKey> {
        (0..n_ghosts).flat_map(|g| Parameter::ALL.into_iter().map(move |p| SignalKey::new(g, p)))
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_g{}", self.parameter, self.ghost)
    }
}

impl FromStr for SignalKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ConfigError::InvalidKey(s.to_string());
        let (name, ghost) = s.rsplit_once("_g").ok_or_else(invalid)?;
        let parameter = name.parse::<Parameter>().map_err(|_| invalid())?;
        let ghost = ghost.parse::<usize>().map_err(|_| invalid())?;
        Ok(Self { ghost, parameter })
    }
}
