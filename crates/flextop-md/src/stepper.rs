//! Spatial integration of real and ghost particles.
//!
//! Forces must be loaded into the particles (see
//! [`ParticleSystem::load_forces`]) before [`PhysicalStepper::advance`]. The
//! Verlet scheme needs forces at the drifted positions to finish the step:
//! reload them, then call [`PhysicalStepper::complete`].

use crate::{BOLTZMANN, Constraints, ParticleSystem, Result, Vec3};
use flextop_signal::ConfigError;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Spatial update scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalScheme {
    /// `v += dt*f/m`, `x += dt*v`, constrain, `v = (x - x0)/dt`.
    #[default]
    Leapfrog,
    /// Velocity Verlet with SHAKE/RATTLE projections.
    Verlet,
    /// Kick, half drift, Ornstein-Uhlenbeck velocity update, half drift.
    LangevinBaoab,
}

impl PhysicalScheme {
    pub fn name(&self) -> &'static str {
        match self {
            PhysicalScheme::Leapfrog => "leapfrog",
            PhysicalScheme::Verlet => "verlet",
            PhysicalScheme::LangevinBaoab => "langevin_baoab",
        }
    }

    /// Whether forces at the drifted positions are needed to finish the step.
    pub fn needs_post_drift_forces(&self) -> bool {
        matches!(self, PhysicalScheme::Verlet)
    }

    pub fn is_stochastic(&self) -> bool {
        matches!(self, PhysicalScheme::LangevinBaoab)
    }
}

/// Langevin heat bath.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thermostat {
    /// Temperature (K).
    pub temperature: f64,
    /// Friction coefficient (1/ps).
    pub friction: f64,
}

impl Thermostat {
    pub fn new(temperature: f64, friction: f64) -> flextop_signal::Result<Self> {
        let thermostat = Self {
            temperature,
            friction,
        };
        thermostat.validate()?;
        Ok(thermostat)
    }

    pub fn validate(&self) -> flextop_signal::Result<()> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "temperature",
                value: self.temperature,
            });
        }
        if !(self.friction.is_finite() && self.friction > 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "friction",
                value: self.friction,
            });
        }
        Ok(())
    }

    /// Thermal energy `k_B*T` (kJ/mol).
    pub fn kt(&self) -> f64 {
        BOLTZMANN * self.temperature
    }

    /// Velocity damping `a = exp(-gamma*dt)` and noise scale
    /// `b = sqrt(1 - exp(-2*gamma*dt))`.
    pub fn coefficients(&self, dt: f64) -> (f64, f64) {
        let a = (-self.friction * dt).exp();
        let b = (1.0 - (-2.0 * self.friction * dt).exp()).sqrt();
        (a, b)
    }
}

/// Resolved scheme; the Langevin arm owns its heat bath.
#[derive(Debug, Clone, Copy)]
enum Integration {
    Leapfrog,
    Verlet,
    LangevinBaoab(Thermostat),
}

/// Advances positions and velocities of every particle by one timestep.
pub struct PhysicalStepper {
    scheme: PhysicalScheme,
    integration: Integration,
    dt: f64,
    thermostat: Option<Thermostat>,
    constraints: Arc<dyn Constraints>,
    /// Positions at the start of the step.
    reference: Vec<Vec3>,
    /// Positions after the drift, before constraint projection.
    drifted: Vec<Vec3>,
}

impl PhysicalStepper {
    pub fn new(
        scheme: PhysicalScheme,
        dt: f64,
        thermostat: Option<Thermostat>,
        constraints: Arc<dyn Constraints>,
    ) -> flextop_signal::Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "timestep",
                value: dt,
            });
        }
        if let Some(t) = &thermostat {
            t.validate()?;
        }
        let integration = match (scheme, thermostat) {
            (PhysicalScheme::Leapfrog, _) => Integration::Leapfrog,
            (PhysicalScheme::Verlet, _) => Integration::Verlet,
            (PhysicalScheme::LangevinBaoab, Some(t)) => Integration::LangevinBaoab(t),
            (PhysicalScheme::LangevinBaoab, None) => {
                return Err(ConfigError::MissingThermostat(scheme.name()));
            }
        };

        Ok(Self {
            scheme,
            integration,
            dt,
            thermostat,
            constraints,
            reference: Vec::new(),
            drifted: Vec::new(),
        })
    }

    pub fn scheme(&self) -> PhysicalScheme {
        self.scheme
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn thermostat(&self) -> Option<&Thermostat> {
        self.thermostat.as_ref()
    }

    pub fn constraints(&self) -> &dyn Constraints {
        self.constraints.as_ref()
    }

    /// First part of the step, using the forces currently loaded. Only the
    /// Langevin scheme draws from `rng`: three normals per mobile particle,
    /// in particle order.
    pub fn advance<R: Rng + ?Sized>(&mut self, system: &mut ParticleSystem, rng: &mut R) -> Result<()> {
        let dt = self.dt;
        self.reference.clear();
        self.reference.extend(system.particles.iter().map(|p| p.x));

        match self.integration {
            Integration::Leapfrog => {
                for p in system.particles.iter_mut().filter(|p| p.mass > 0.0) {
                    p.v += dt * p.f / p.mass;
                    p.x += dt * p.v;
                }
                self.constraints
                    .constrain_positions(&mut system.particles, &self.reference)?;
                for (p, x0) in system.particles.iter_mut().zip(&self.reference) {
                    if p.mass > 0.0 {
                        p.v = (p.x - x0) / dt;
                    }
                }
            }
            Integration::Verlet => {
                for p in system.particles.iter_mut().filter(|p| p.mass > 0.0) {
                    p.v += 0.5 * dt * p.f / p.mass;
                    p.x += dt * p.v;
                }
                self.save_drifted(system);
                self.constraints
                    .constrain_positions(&mut system.particles, &self.reference)?;
            }
            Integration::LangevinBaoab(thermostat) => {
                let (a, b) = thermostat.coefficients(dt);
                let kt = thermostat.kt();

                for p in system.particles.iter_mut().filter(|p| p.mass > 0.0) {
                    p.v += dt * p.f / p.mass;
                }
                self.constraints.constrain_velocities(&mut system.particles)?;

                for p in system.particles.iter_mut().filter(|p| p.mass > 0.0) {
                    p.x += 0.5 * dt * p.v;
                    let sigma = b * (kt / p.mass).sqrt();
                    for d in 0..3 {
                        let z: f64 = rng.sample(StandardNormal);
                        p.v[d] = a * p.v[d] + sigma * z;
                    }
                    p.x += 0.5 * dt * p.v;
                }

                self.save_drifted(system);
                self.constraints
                    .constrain_positions(&mut system.particles, &self.reference)?;
                for (p, x1) in system.particles.iter_mut().zip(&self.drifted) {
                    if p.mass > 0.0 {
                        p.v += (p.x - x1) / dt;
                    }
                }
            }
        }
        Ok(())
    }

    /// Second half kick of the Verlet scheme with the forces now loaded, plus
    /// the velocity correction from the position projection. No-op for the
    /// other schemes.
    pub fn complete(&mut self, system: &mut ParticleSystem) -> Result<()> {
        if !self.scheme.needs_post_drift_forces() {
            return Ok(());
        }
        let dt = self.dt;
        for (p, x1) in system.particles.iter_mut().zip(&self.drifted) {
            if p.mass > 0.0 {
                p.v += 0.5 * dt * p.f / p.mass + (p.x - x1) / dt;
            }
        }
        self.constraints.constrain_velocities(&mut system.particles)
    }

    fn save_drifted(&mut self, system: &ParticleSystem) {
        self.drifted.clear();
        self.drifted.extend(system.particles.iter().map(|p| p.x));
    }
}

impl std::fmt::Debug for PhysicalStepper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalStepper")
            .field("scheme", &self.scheme)
            .field("dt", &self.dt)
            .field("thermostat", &self.thermostat)
            .field("constraints", &self.constraints.count())
            .finish()
    }
}
