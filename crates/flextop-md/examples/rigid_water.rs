//! Rigid water molecule sampled by a ghost particle under Langevin dynamics.

use flextop_md::{
    AtomParameters, Constraints, DistanceConstraint, DistanceConstraints, Evaluation, ForceSet,
    GhostNonbonded, Particle, ParticleSystem, PhysicalScheme, PhysicalStepper, Thermostat, Vec3,
    GHOST_MASS,
};
use flextop_signal::{Bounds, SignalRecord, SignalStore};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // O-H 0.09572 nm, H-O-H 104.52 degrees.
    let r_oh = 0.09572;
    let half_angle = 104.52_f64.to_radians() / 2.0;
    let r_hh = 2.0 * r_oh * half_angle.sin();

    let mut system = ParticleSystem::new();
    system.add_particle(Particle::new(Vec3::zeros(), 15.999))?;
    system.add_particle(Particle::new(
        Vec3::new(r_oh * half_angle.sin(), r_oh * half_angle.cos(), 0.0),
        1.008,
    ))?;
    system.add_particle(Particle::new(
        Vec3::new(-r_oh * half_angle.sin(), r_oh * half_angle.cos(), 0.0),
        1.008,
    ))?;
    system.add_ghost(Vec3::new(0.0, -0.35, 0.0), GHOST_MASS);

    let water = vec![
        AtomParameters::new(-0.834, 0.315061, 0.6364),
        AtomParameters::new(0.417, 0.0, 0.0),
        AtomParameters::new(0.417, 0.0, 0.0),
    ];
    let forces = ForceSet::new().with_term(Arc::new(GhostNonbonded::new(water, 1.0)));
    let signals = SignalStore::new(&[SignalRecord::new(0.4, 0.2, 0.5, 1.0)], &Bounds::default())?;

    let constraints = DistanceConstraints::new(vec![
        DistanceConstraint { i: 0, j: 1, length: r_oh },
        DistanceConstraint { i: 0, j: 2, length: r_oh },
        DistanceConstraint { i: 1, j: 2, length: r_hh },
    ]);
    constraints.validate(system.len())?;
    let n_constraints = constraints.constraints().len();

    let thermostat = Thermostat::new(300.0, 1.0)?;
    let mut stepper = PhysicalStepper::new(
        PhysicalScheme::LangevinBaoab,
        0.002,
        Some(thermostat),
        Arc::new(constraints),
    )?;

    let mut rng = StdRng::seed_from_u64(2024);
    system.initialize_velocities(300.0, &mut rng);
    let mut eval = Evaluation::new(system.len(), system.n_ghosts());

    for step in 1..=2000 {
        forces.evaluate(&system, &signals, &mut eval);
        system.load_forces(&eval.forces)?;
        stepper.advance(&mut system, &mut rng)?;

        if step % 200 == 0 {
            let d_oh = (system.particles[1].x - system.particles[0].x).norm();
            let d_ghost = (system.ghost(0).x - system.particles[0].x).norm();
            log::info!(
                "step {step:5}  T = {:6.1} K  E_pot = {:9.3} kJ/mol  O-H = {d_oh:.5} nm  O-ghost = {d_ghost:.3} nm",
                system.temperature(n_constraints),
                eval.potential_energy(),
            );
        }
    }

    Ok(())
}
