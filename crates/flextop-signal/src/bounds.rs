//! Static clamping intervals and dynamics coefficients, validated once at construction.

use crate::{ConfigError, Parameter, PerParameter, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed interval `[low, high]` with `low < high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    /// Unchecked constructor; validation happens in [`Bounds::new`].
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Clamp `value` into the interval. NaN passes through unchanged so that
    /// divergence stays visible to the caller.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    fn validate(&self, parameter: Parameter) -> Result<()> {
        if !(self.low.is_finite() && self.high.is_finite() && self.low < self.high) {
            return Err(ConfigError::InvertedBounds {
                parameter,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Clamping interval for every signal parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds(PerParameter<Interval>);

impl Bounds {
    /// Validate and build. Every interval must satisfy `low < high`.
    pub fn new(intervals: PerParameter<Interval>) -> Result<Self> {
        for (p, interval) in intervals.iter() {
            interval.validate(p)?;
        }
        Ok(Self(intervals))
    }

    /// Build from a name-keyed map, e.g. one parsed from a configuration file.
    /// All four names are required and unknown names are rejected.
    pub fn from_named<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, (f64, f64))>,
    {
        let mut table: BTreeMap<Parameter, Interval> = BTreeMap::new();
        for (name, (low, high)) in entries {
            table.insert(name.parse()?, Interval::new(low, high));
        }
        Self::from_map(&table)
    }

    pub fn from_map(table: &BTreeMap<Parameter, Interval>) -> Result<Self> {
        let mut intervals = PerParameter::splat(Interval::new(0.0, 0.0));
        for p in Parameter::ALL {
            intervals[p] = *table.get(&p).ok_or(ConfigError::MissingParameter(p))?;
        }
        Self::new(intervals)
    }

    /// Intervals used for ghost assembly in a protein pocket.
    pub fn ghost_defaults() -> Self {
        Self(PerParameter::new(
            Interval::new(-1.27, 2.194),
            Interval::new(0.022, 0.23),
            Interval::new(0.037, 2.63),
            Interval::new(0.0, 1.0),
        ))
    }

    #[inline]
    pub fn get(&self, p: Parameter) -> Interval {
        self.0[p]
    }

    #[inline]
    pub fn clamp(&self, p: Parameter, value: f64) -> f64 {
        self.0[p].clamp(value)
    }

    pub fn intervals(&self) -> &PerParameter<Interval> {
        &self.0
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::ghost_defaults()
    }
}

/// Positive per-parameter coefficient: a mass for inertial rules, a friction
/// divisor for Langevin rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients(PerParameter<f64>);

impl Coefficients {
    pub fn new(values: PerParameter<f64>) -> Result<Self> {
        for (parameter, &value) in values.iter() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveCoefficient { parameter, value });
            }
        }
        Ok(Self(values))
    }

    pub fn from_named<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut table: BTreeMap<Parameter, f64> = BTreeMap::new();
        for (name, value) in entries {
            table.insert(name.parse()?, value);
        }
        Self::from_map(&table)
    }

    pub fn from_map(table: &BTreeMap<Parameter, f64>) -> Result<Self> {
        let mut values = PerParameter::splat(0.0);
        for p in Parameter::ALL {
            values[p] = *table.get(&p).ok_or(ConfigError::MissingParameter(p))?;
        }
        Self::new(values)
    }

    /// Friction coefficients used for ghost assembly in a protein pocket.
    pub fn ghost_defaults() -> Self {
        Self(PerParameter::new(5.0e6, 1.0e7, 1.0e6, 1.0e6))
    }

    #[inline]
    pub fn get(&self, p: Parameter) -> f64 {
        self.0[p]
    }

    pub fn values(&self) -> &PerParameter<f64> {
        &self.0
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::ghost_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_bounds() -> Vec<(&'static str, (f64, f64))> {
        vec![
            ("charge", (-1.0, 1.0)),
            ("sigma", (0.02, 0.2)),
            ("epsilon", (0.2, 10.0)),
            ("lambda", (0.0, 1.0)),
        ]
    }

    #[test]
    fn test_bounds_from_named() {
        let bounds = Bounds::from_named(named_bounds()).unwrap();
        assert_eq!(bounds.get(Parameter::Sigma), Interval::new(0.02, 0.2));
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let mut entries = named_bounds();
        entries[3] = ("lambda", (1.0, 1.0));
        let err = Bounds::from_named(entries).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvertedBounds { parameter: Parameter::Lambda, .. }
        ));
    }

    #[test]
    fn test_missing_and_unknown_names() {
        let mut entries = named_bounds();
        entries.pop();
        assert_eq!(
            Bounds::from_named(entries).unwrap_err(),
            ConfigError::MissingParameter(Parameter::Lambda)
        );

        let mut entries = named_bounds();
        entries.push(("mass", (0.0, 1.0)));
        assert!(matches!(
            Bounds::from_named(entries),
            Err(ConfigError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_clamp_is_idempotent_inside_bounds() {
        let interval = Interval::new(0.0, 1.0);
        for v in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(interval.clamp(v), v);
            assert_eq!(interval.clamp(interval.clamp(v)), v);
        }
        assert_eq!(interval.clamp(1.5), 1.0);
        assert_eq!(interval.clamp(-0.5), 0.0);
        assert!(interval.clamp(f64::NAN).is_nan());
    }

    #[test]
    fn test_negative_coefficient_rejected() {
        let err = Coefficients::from_named([
            ("charge", 1.0),
            ("sigma", -1.0),
            ("epsilon", 1.0),
            ("lambda", 1.0),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositiveCoefficient {
                parameter: Parameter::Sigma,
                value: -1.0
            }
        );
    }

    #[test]
    fn test_zero_coefficient_rejected() {
        let values = PerParameter::new(1.0, 1.0, 0.0, 1.0);
        assert!(matches!(
            Coefficients::new(values),
            Err(ConfigError::NonPositiveCoefficient { parameter: Parameter::Epsilon, .. })
        ));
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Bounds::new(*Bounds::ghost_defaults().intervals()).is_ok());
        assert!(Coefficients::new(*Coefficients::ghost_defaults().values()).is_ok());
    }
}
