//! Four ghosts relax next to a fixed pocket while their total charge is held
//! at -1.

use flextop::{
    AtomParameters, FlatBottomRestraint, GhostNonbonded, IntegratorBuilder, IntegratorVariant,
    LogReporter, Parameter, Particle, ParticleSystem, Reporter, SignalRecord, SignalRecorder,
    Simulation, Vec3,
};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Pocket atoms are immobile.
    let pocket = [
        (Vec3::new(0.0, 0.0, 0.0), AtomParameters::new(0.5, 0.32, 0.7)),
        (Vec3::new(0.6, 0.0, 0.0), AtomParameters::new(0.4, 0.34, 0.4)),
        (Vec3::new(0.3, 0.55, 0.0), AtomParameters::new(-0.2, 0.30, 0.6)),
    ];

    let mut system = ParticleSystem::new();
    let mut atoms = Vec::new();
    for (x, params) in pocket {
        system.add_particle(Particle::new(x, 0.0))?;
        atoms.push(params);
    }
    let anchors: Vec<usize> = (0..atoms.len()).collect();
    for offset in [
        Vec3::new(0.3, 0.2, 0.35),
        Vec3::new(0.3, 0.2, -0.35),
        Vec3::new(0.05, 0.25, 0.3),
        Vec3::new(0.55, 0.25, -0.3),
    ] {
        system.add_ghost(offset, flextop::flextop_md::GHOST_MASS);
    }

    let integrator = IntegratorBuilder::new(system)
        .variant(IntegratorVariant::HybridConstCharge { target: -1.0 })
        .thermostat(300.0, 1.0)
        .timestep(0.002)
        .seed(2024)
        .signals(vec![SignalRecord::new(-0.25, 0.15, 0.5, 0.5); 4])
        .force(Arc::new(GhostNonbonded::new(atoms, 1.0)))
        .force(Arc::new(FlatBottomRestraint::new(anchors, 2000.0, 0.4)))
        .build()?;

    let mut recorder = SignalRecorder::new(50);
    let mut logger = LogReporter::new(500);
    let mut simulation = Simulation::new(integrator).with_check_interval(10);
    simulation.run(5000, &mut [&mut recorder as &mut dyn Reporter, &mut logger])?;

    for g in 0..4 {
        let lambda = recorder.column(g, Parameter::Lambda);
        let charge = recorder.column(g, Parameter::Charge);
        log::info!(
            "ghost {g}: lambda {:.3} -> {:.3}, charge {:+.3} -> {:+.3}",
            lambda.first().copied().unwrap_or_default(),
            lambda.last().copied().unwrap_or_default(),
            charge.first().copied().unwrap_or_default(),
            charge.last().copied().unwrap_or_default(),
        );
    }

    let mut integrator = simulation.into_integrator();
    integrator.finalize();
    Ok(())
}
