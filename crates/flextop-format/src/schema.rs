//! Integrator configuration schema and loader.

use crate::error::Result;
use flextop_md::{PhysicalScheme, Thermostat};
use flextop_signal::{Bounds, Coefficients, ConfigError, ParameterRule, VelocityOnClamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Everything needed to construct an integrator, apart from the system and
/// its force terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// Timestep (ps).
    #[serde(default = "default_timestep")]
    pub timestep: f64,
    /// Spatial scheme.
    #[serde(default)]
    pub scheme: PhysicalScheme,
    /// Parameter update rule.
    #[serde(default = "default_rule")]
    pub rule: ParameterRule,
    /// Clamping interval per parameter name, `[low, high]`.
    #[serde(default = "default_bounds")]
    pub bounds: BTreeMap<String, [f64; 2]>,
    /// Dynamics coefficient per parameter name.
    #[serde(default = "default_coefficients")]
    pub coefficients: BTreeMap<String, f64>,
    /// Heat bath shared by the spatial and parameter Langevin stages.
    #[serde(default)]
    pub thermostat: Option<Thermostat>,
    /// Seed of both random streams.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub velocity_on_clamp: VelocityOnClamp,
    /// Reject (ghost, parameter) pairs no force term differentiates.
    #[serde(default = "default_strict")]
    pub strict_derivatives: bool,
}

fn default_timestep() -> f64 {
    0.002
}

fn default_rule() -> ParameterRule {
    ParameterRule::Deterministic
}

fn default_bounds() -> BTreeMap<String, [f64; 2]> {
    Bounds::ghost_defaults()
        .intervals()
        .iter()
        .map(|(p, i)| (p.name().to_string(), [i.low, i.high]))
        .collect()
}

fn default_coefficients() -> BTreeMap<String, f64> {
    Coefficients::ghost_defaults()
        .values()
        .iter()
        .map(|(p, c)| (p.name().to_string(), *c))
        .collect()
}

fn default_strict() -> bool {
    true
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            scheme: PhysicalScheme::default(),
            rule: default_rule(),
            bounds: default_bounds(),
            coefficients: default_coefficients(),
            thermostat: None,
            seed: 0,
            velocity_on_clamp: VelocityOnClamp::default(),
            strict_derivatives: default_strict(),
        }
    }
}

impl IntegratorConfig {
    /// Parse and validate bounds.
    pub fn bounds(&self) -> Result<Bounds> {
        Ok(Bounds::from_named(
            self.bounds.iter().map(|(name, [low, high])| (name.as_str(), (*low, *high))),
        )?)
    }

    /// Parse and validate coefficients.
    pub fn coefficients(&self) -> Result<Coefficients> {
        Ok(Coefficients::from_named(
            self.coefficients.iter().map(|(name, c)| (name.as_str(), *c)),
        )?)
    }

    /// Check every field that can be checked without a system.
    pub fn validate(&self) -> Result<()> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(ConfigError::InvalidSetting {
                name: "timestep",
                value: self.timestep,
            }
            .into());
        }
        self.bounds()?;
        self.coefficients()?;

        match &self.thermostat {
            Some(t) => t.validate()?,
            None if self.scheme.is_stochastic() => {
                return Err(ConfigError::MissingThermostat(self.scheme.name()).into());
            }
            None if self.rule.is_stochastic() => {
                return Err(ConfigError::MissingThermostat(self.rule.name()).into());
            }
            None => {}
        }
        Ok(())
    }
}

/// Parse and validate a configuration from JSON text.
pub fn config_from_json(json: &str) -> Result<IntegratorConfig> {
    let config: IntegratorConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load an integrator configuration from file.
pub fn load_config(path: impl AsRef<Path>) -> Result<IntegratorConfig> {
    let json = std::fs::read_to_string(path)?;
    config_from_json(&json)
}

/// Save an integrator configuration to file.
pub fn save_config(path: impl AsRef<Path>, config: &IntegratorConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}
