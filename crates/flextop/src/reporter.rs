//! Periodic observers of a running simulation.

use flextop_md::Vec3;
use flextop_signal::{Parameter, SignalRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// State handed to reporters after a step.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub step: u64,
    /// Simulation time (ps).
    pub time: f64,
    /// Signal values per ghost.
    pub signals: Vec<SignalRecord>,
    /// Potential energy per force group (kJ/mol).
    pub energies: BTreeMap<u32, f64>,
    pub kinetic_energy: f64,
    /// Instantaneous temperature (K).
    pub temperature: f64,
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
}

impl Snapshot {
    pub fn potential_energy(&self) -> f64 {
        self.energies.values().sum()
    }
}

/// Something invoked every `interval()` steps.
pub trait Reporter {
    /// Steps between reports. Zero disables the reporter.
    fn interval(&self) -> usize;

    fn report(&mut self, snapshot: &Snapshot);
}

/// Records signal trajectories and energies.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignalRecorder {
    #[serde(skip)]
    interval: usize,
    /// Step of each record.
    pub step_history: Vec<u64>,
    pub time_history: Vec<f64>,
    /// Signal values per ghost at each record.
    pub signal_history: Vec<Vec<SignalRecord>>,
    /// Total potential energy at each record.
    pub energy_history: Vec<f64>,
}

impl SignalRecorder {
    pub fn new(interval: usize) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.step_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step_history.is_empty()
    }

    pub fn clear(&mut self) {
        self.step_history.clear();
        self.time_history.clear();
        self.signal_history.clear();
        self.energy_history.clear();
    }

    /// Recorded values of one (ghost, parameter) pair.
    pub fn column(&self, ghost: usize, parameter: Parameter) -> Vec<f64> {
        self.signal_history
            .iter()
            .filter_map(|records| records.get(ghost).map(|r| r.get(parameter)))
            .collect()
    }

    /// Export to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Reporter for SignalRecorder {
    fn interval(&self) -> usize {
        self.interval
    }

    fn report(&mut self, snapshot: &Snapshot) {
        self.step_history.push(snapshot.step);
        self.time_history.push(snapshot.time);
        self.signal_history.push(snapshot.signals.clone());
        self.energy_history.push(snapshot.potential_energy());
    }
}

/// Logs a one-line status at `info` level.
#[derive(Debug, Clone, Copy)]
pub struct LogReporter {
    interval: usize,
}

impl LogReporter {
    pub fn new(interval: usize) -> Self {
        Self { interval }
    }
}

impl Reporter for LogReporter {
    fn interval(&self) -> usize {
        self.interval
    }

    fn report(&mut self, snapshot: &Snapshot) {
        let total_charge: f64 = snapshot.signals.iter().map(|r| r.charge).sum();
        let mean_lambda = if snapshot.signals.is_empty() {
            0.0
        } else {
            snapshot.signals.iter().map(|r| r.lambda).sum::<f64>() / snapshot.signals.len() as f64
        };
        log::info!(
            "step {:8}  t = {:9.3} ps  E_pot = {:12.4}  T = {:7.2} K  sum(q) = {:+.6}  <lambda> = {:.4}",
            snapshot.step,
            snapshot.time,
            snapshot.potential_energy(),
            snapshot.temperature,
            total_charge,
            mean_lambda,
        );
    }
}
