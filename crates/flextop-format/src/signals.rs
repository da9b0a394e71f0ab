//! Ghost signal tables and signal-state checkpoints.
//!
//! A signal table holds one whitespace-separated row per ghost, in ghost
//! order: `charge sigma epsilon lambda`. Blank lines and `#` comments are
//! ignored.

use crate::error::{FormatError, Result};
use flextop_signal::{SignalRecord, SignalStore};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Parse a signal table.
pub fn read_signal_table<R: BufRead>(reader: R) -> Result<Vec<SignalRecord>> {
    let mut records = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let fields = content
            .split_whitespace()
            .map(|f| f.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| FormatError::InvalidFormat(format!("line {}: {e}", n + 1)))?;
        let &[charge, sigma, epsilon, lambda] = fields.as_slice() else {
            return Err(FormatError::InvalidFormat(format!(
                "line {}: expected 4 columns, found {}",
                n + 1,
                fields.len()
            )));
        };
        records.push(SignalRecord::new(charge, sigma, epsilon, lambda));
    }
    Ok(records)
}

/// Write a signal table with a header comment.
pub fn write_signal_table<W: Write>(mut writer: W, records: &[SignalRecord]) -> Result<()> {
    writeln!(writer, "# charge sigma epsilon lambda")?;
    for r in records {
        writeln!(writer, "{} {} {} {}", r.charge, r.sigma, r.epsilon, r.lambda)?;
    }
    Ok(())
}

pub fn load_signal_table(path: impl AsRef<Path>) -> Result<Vec<SignalRecord>> {
    read_signal_table(BufReader::new(File::open(path)?))
}

pub fn save_signal_table(path: impl AsRef<Path>, records: &[SignalRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_signal_table(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Signal state at a given step, for resuming a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalCheckpoint {
    /// Completed steps.
    pub step: u64,
    /// Simulation time (ps).
    pub time: f64,
    /// Noise seed of the run; with `step` it fixes every later draw.
    #[serde(default)]
    pub seed: u64,
    /// Values and auxiliary velocities of every ghost.
    pub store: SignalStore,
}

/// Save a checkpoint as JSON.
pub fn save_checkpoint(path: impl AsRef<Path>, checkpoint: &SignalCheckpoint) -> Result<()> {
    let json = serde_json::to_string_pretty(checkpoint)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load and validate a checkpoint.
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<SignalCheckpoint> {
    let json = std::fs::read_to_string(path)?;
    let checkpoint: SignalCheckpoint = serde_json::from_str(&json)?;
    checkpoint.store.validate()?;
    Ok(checkpoint)
}
