//! Energy derivatives with respect to ghost signal parameters.

use crate::{Parameter, PerParameter, SignalKey};

/// Accumulated `dE/dp` for every (ghost, parameter) pair of one evaluation.
///
/// Force terms add their contribution with [`EnergyDerivatives::add`]; the
/// parameter stepper only reads. A pair no term writes to stays at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyDerivatives {
    d_energy: Vec<PerParameter<f64>>,
}

impl EnergyDerivatives {
    pub fn new(n_ghosts: usize) -> Self {
        Self {
            d_energy: vec![PerParameter::splat(0.0); n_ghosts],
        }
    }

    pub fn n_ghosts(&self) -> usize {
        self.d_energy.len()
    }

    pub fn clear(&mut self) {
        for d in &mut self.d_energy {
            *d = PerParameter::splat(0.0);
        }
    }

    /// Add a contribution to `dE/dp` of `ghost`.
    #[inline]
    pub fn add(&mut self, ghost: usize, p: Parameter, d_energy: f64) {
        self.d_energy[ghost][p] += d_energy;
    }

    /// `dE/dp` of `ghost`.
    #[inline]
    pub fn energy_derivative(&self, ghost: usize, p: Parameter) -> f64 {
        self.d_energy[ghost][p]
    }

    /// Generalized force `-dE/dp` of `ghost`.
    #[inline]
    pub fn force(&self, ghost: usize, p: Parameter) -> f64 {
        -self.d_energy[ghost][p]
    }

    pub fn get(&self, key: SignalKey) -> Option<f64> {
        self.d_energy.get(key.ghost).map(|d| d[key.parameter])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contributions_accumulate() {
        let mut d = EnergyDerivatives::new(2);
        d.add(1, Parameter::Charge, 1.5);
        d.add(1, Parameter::Charge, 0.5);
        assert_eq!(d.energy_derivative(1, Parameter::Charge), 2.0);
        assert_eq!(d.force(1, Parameter::Charge), -2.0);
        assert_eq!(d.get(SignalKey::new(1, Parameter::Charge)), Some(2.0));
        assert_eq!(d.get(SignalKey::new(2, Parameter::Charge)), None);

        d.clear();
        assert_eq!(d.energy_derivative(1, Parameter::Charge), 0.0);
    }
}
