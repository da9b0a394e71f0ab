//! Conservation monitoring of total ghost charge under noisy parameter dynamics.
//!
//! Compares the equal-share and re-clamping corrections on ghosts whose
//! charges are pushed against the lower bound.

use flextop_guardian::{ConservationMonitor, ConservationState, SignalHealth};
use flextop_signal::{
    Bounds, Coefficients, Conservation, CorrectionPolicy, EnergyDerivatives, Parameter,
    ParameterRule, ParameterStepper, PerParameter, SignalRecord, SignalStore,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bounds = Bounds::default();
    let coefficients = Coefficients::new(PerParameter::splat(10.0))?;
    let kt = 2.494;

    for policy in [CorrectionPolicy::EqualShare, CorrectionPolicy::Reclamp] {
        let conservation = Conservation::charge(-2.0).with_policy(policy);
        let stepper = ParameterStepper::new(
            ParameterRule::LangevinConserved(conservation),
            bounds,
            coefficients,
            0.002,
            kt,
        )?;
        let baseline = ConservationState::from_conservation(&conservation);

        let records = vec![SignalRecord::new(-0.5, 0.1, 1.0, 0.5); 4];
        let mut store = SignalStore::new(&records, &bounds)?;

        // Steady push toward negative charge.
        let mut derivatives = EnergyDerivatives::new(4);
        for g in 0..4 {
            derivatives.add(g, Parameter::Charge, 50.0);
        }

        let mut rng = StdRng::seed_from_u64(11);
        let mut worst = 0.0_f64;
        let mut health = SignalHealth::Nominal;
        for _ in 0..5000 {
            let summary = stepper.advance(&mut store, &derivatives, &mut rng)?;
            let monitor = ConservationMonitor::check(&baseline, &store, &bounds);
            worst = worst.max(monitor.max_error());
            health = health.max(SignalHealth::assess(&monitor, &summary, 4));
        }

        println!(
            "{policy:?}: charges = {:?}, worst invariant error = {worst:.3e} ({health:?})",
            store.column(Parameter::Charge),
        );
    }

    Ok(())
}
