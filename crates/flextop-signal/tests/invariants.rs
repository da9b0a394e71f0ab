//! Long-run invariants of the parameter stepper under fluctuating forces.

use flextop_signal::{
    Bounds, Coefficients, Conservation, EnergyDerivatives, Parameter, ParameterRule,
    ParameterStepper, PerParameter, SignalRecord, SignalStore,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N_GHOSTS: usize = 6;

fn initial_store(bounds: &Bounds) -> SignalStore {
    let records: Vec<_> = (0..N_GHOSTS)
        .map(|g| SignalRecord::new(0.1 * g as f64 - 0.2, 0.1, 0.5, 0.5))
        .collect();
    SignalStore::new(&records, bounds).unwrap()
}

/// Random derivatives large enough to drive values into their bounds.
fn random_derivatives(rng: &mut StdRng) -> EnergyDerivatives {
    let mut d = EnergyDerivatives::new(N_GHOSTS);
    for g in 0..N_GHOSTS {
        for p in Parameter::ALL {
            d.add(g, p, rng.gen_range(-500.0..500.0));
        }
    }
    d
}

fn all_rules() -> Vec<ParameterRule> {
    vec![
        ParameterRule::Deterministic,
        ParameterRule::Inertial,
        ParameterRule::Langevin,
        ParameterRule::LangevinConserved(Conservation::charge(0.0)),
    ]
}

#[test]
fn test_values_stay_inside_bounds() {
    let bounds = Bounds::default();
    let coefficients = Coefficients::new(PerParameter::new(1.0, 10.0, 1.0, 1.0)).unwrap();

    for rule in all_rules() {
        let stepper = ParameterStepper::new(rule, bounds, coefficients, 0.002, 2.494).unwrap();
        let mut store = initial_store(&bounds);
        let mut forces_rng = StdRng::seed_from_u64(100);
        let mut noise_rng = StdRng::seed_from_u64(200);

        for step in 0..500 {
            let derivs = random_derivatives(&mut forces_rng);
            stepper.advance(&mut store, &derivs, &mut noise_rng).unwrap();
            stepper.finish(&mut store, &derivs).unwrap();

            for g in 0..N_GHOSTS {
                for p in Parameter::ALL {
                    // The equal-share correction is allowed to move charge out of bounds.
                    if rule.conservation().is_some() && p == Parameter::Charge {
                        continue;
                    }
                    let v = store.value(g, p);
                    assert!(
                        bounds.get(p).contains(v),
                        "{} step {step}: {p} of ghost {g} = {v}",
                        rule.name()
                    );
                }
            }
        }
        assert!(store.is_finite());
    }
}

#[test]
fn test_conserved_total_after_every_step() {
    let bounds = Bounds::default();
    let coefficients = Coefficients::new(PerParameter::splat(5.0)).unwrap();
    let rule = ParameterRule::LangevinConserved(Conservation::charge(-1.0));
    let stepper = ParameterStepper::new(rule, bounds, coefficients, 0.001, 2.494).unwrap();

    let mut store = initial_store(&bounds);
    let mut forces_rng = StdRng::seed_from_u64(1);
    let mut noise_rng = StdRng::seed_from_u64(2);

    for _ in 0..300 {
        stepper
            .advance(&mut store, &random_derivatives(&mut forces_rng), &mut noise_rng)
            .unwrap();
        let total = store.total(Parameter::Charge);
        assert!((total + 1.0).abs() <= 1e-10, "total charge drifted to {total}");
    }
}
