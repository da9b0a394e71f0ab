//! Parameter State Store: value and auxiliary velocity for every (ghost, parameter).

use crate::{Bounds, ConfigError, EnergyDerivatives, Parameter, PerParameter, Result, SignalKey};
use serde::{Deserialize, Serialize};

/// Externally supplied signal values of one ghost, ordered by ghost index.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalRecord {
    pub charge: f64,
    pub sigma: f64,
    pub epsilon: f64,
    pub lambda: f64,
}

impl SignalRecord {
    pub fn new(charge: f64, sigma: f64, epsilon: f64, lambda: f64) -> Self {
        Self {
            charge,
            sigma,
            epsilon,
            lambda,
        }
    }

    pub fn get(&self, p: Parameter) -> f64 {
        match p {
            Parameter::Charge => self.charge,
            Parameter::Sigma => self.sigma,
            Parameter::Epsilon => self.epsilon,
            Parameter::Lambda => self.lambda,
        }
    }

    pub fn to_table(self) -> PerParameter<f64> {
        PerParameter::from_fn(|p| self.get(p))
    }

    pub fn from_table(table: &PerParameter<f64>) -> Self {
        Self::new(
            table[Parameter::Charge],
            table[Parameter::Sigma],
            table[Parameter::Epsilon],
            table[Parameter::Lambda],
        )
    }
}

/// Current signal state of every ghost.
///
/// Force derivatives are kept only for inspection: they are overwritten on
/// every step and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStore {
    values: Vec<PerParameter<f64>>,
    velocities: Vec<PerParameter<f64>>,
    #[serde(skip)]
    forces: Vec<PerParameter<f64>>,
}

impl SignalStore {
    /// Create the store from initial records. Values must be finite; values
    /// outside `bounds` are accepted and pulled inside by the first step.
    pub fn new(records: &[SignalRecord], bounds: &Bounds) -> Result<Self> {
        let mut values = Vec::with_capacity(records.len());
        for (ghost, record) in records.iter().enumerate() {
            let table = record.to_table();
            for (parameter, &value) in table.iter() {
                let key = SignalKey::new(ghost, parameter);
                if !value.is_finite() {
                    return Err(ConfigError::NonFiniteValue { key, value });
                }
                if !bounds.get(parameter).contains(value) {
                    log::warn!("initial {key} = {value} lies outside its bounds");
                }
            }
            values.push(table);
        }

        let n = values.len();
        Ok(Self {
            values,
            velocities: vec![PerParameter::splat(0.0); n],
            forces: vec![PerParameter::splat(0.0); n],
        })
    }

    pub fn n_ghosts(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn value(&self, ghost: usize, p: Parameter) -> f64 {
        self.values[ghost][p]
    }

    #[inline]
    pub fn set_value(&mut self, ghost: usize, p: Parameter, value: f64) {
        self.values[ghost][p] = value;
    }

    #[inline]
    pub fn velocity(&self, ghost: usize, p: Parameter) -> f64 {
        self.velocities[ghost][p]
    }

    #[inline]
    pub fn set_velocity(&mut self, ghost: usize, p: Parameter, velocity: f64) {
        self.velocities[ghost][p] = velocity;
    }

    /// Last force derivative `-dE/dp` read for this pair.
    #[inline]
    pub fn force(&self, ghost: usize, p: Parameter) -> f64 {
        self.forces.get(ghost).map_or(0.0, |f| f[p])
    }

    pub fn values(&self, ghost: usize) -> &PerParameter<f64> {
        &self.values[ghost]
    }

    /// Sum of one parameter over all ghosts.
    pub fn total(&self, p: Parameter) -> f64 {
        self.values.iter().map(|v| v[p]).sum()
    }

    pub fn column(&self, p: Parameter) -> Vec<f64> {
        self.values.iter().map(|v| v[p]).collect()
    }

    pub fn records(&self) -> Vec<SignalRecord> {
        self.values.iter().map(SignalRecord::from_table).collect()
    }

    /// Every value and velocity is finite.
    pub fn is_finite(&self) -> bool {
        self.values
            .iter()
            .chain(&self.velocities)
            .all(|t| t.iter().all(|(_, x)| x.is_finite()))
    }

    /// Check a deserialized store: one velocity row per ghost and finite state.
    pub fn validate(&self) -> Result<()> {
        if self.velocities.len() != self.values.len() {
            return Err(ConfigError::GhostCountMismatch {
                expected: self.values.len(),
                actual: self.velocities.len(),
            });
        }
        for key in SignalKey::all(self.n_ghosts()) {
            for value in [
                self.value(key.ghost, key.parameter),
                self.velocity(key.ghost, key.parameter),
            ] {
                if !value.is_finite() {
                    return Err(ConfigError::NonFiniteValue { key, value });
                }
            }
        }
        Ok(())
    }

    /// Copy `-dE/dp` for every pair out of a fresh evaluation.
    pub(crate) fn load_forces(&mut self, derivatives: &EnergyDerivatives) {
        self.forces.resize(self.values.len(), PerParameter::splat(0.0));
        for (ghost, forces) in self.forces.iter_mut().enumerate() {
            *forces = PerParameter::from_fn(|p| derivatives.force(ghost, p));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SignalRecord> {
        vec![
            SignalRecord::new(0.5, 0.1, 1.0, 0.5),
            SignalRecord::new(-0.2, 0.15, 0.5, 1.0),
        ]
    }

    #[test]
    fn test_store_layout() {
        let store = SignalStore::new(&records(), &Bounds::default()).unwrap();
        assert_eq!(store.n_ghosts(), 2);
        assert_eq!(store.value(1, Parameter::Sigma), 0.15);
        assert_eq!(store.velocity(1, Parameter::Sigma), 0.0);
        assert!((store.total(Parameter::Charge) - 0.3).abs() < 1e-12);
        assert_eq!(store.records(), records());
    }

    #[test]
    fn test_non_finite_initial_value_rejected() {
        let mut recs = records();
        recs[1].epsilon = f64::INFINITY;
        let err = SignalStore::new(&recs, &Bounds::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonFiniteValue { key, .. } if key == SignalKey::new(1, Parameter::Epsilon)
        ));
    }

    #[test]
    fn test_forces_are_not_serialized() {
        let mut store = SignalStore::new(&records(), &Bounds::default()).unwrap();
        let mut derivs = EnergyDerivatives::new(2);
        derivs.add(0, Parameter::Lambda, 3.0);
        store.load_forces(&derivs);
        assert_eq!(store.force(0, Parameter::Lambda), -3.0);

        let json = serde_json::to_string(&store).unwrap();
        assert!(!json.contains("forces"));
        let restored: SignalStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.value(0, Parameter::Lambda), 0.5);
        assert_eq!(restored.force(0, Parameter::Lambda), 0.0);
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_ragged_store() {
        let json = r#"{"values": [[0.0, 0.1, 1.0, 0.5]], "velocities": []}"#;
        let store: SignalStore = serde_json::from_str(json).unwrap();
        assert_eq!(
            store.validate().unwrap_err(),
            ConfigError::GhostCountMismatch {
                expected: 1,
                actual: 0
            }
        );
    }
}
