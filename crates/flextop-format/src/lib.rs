//! File formats for ghost-particle runs.
//!
//! - Integrator configuration as JSON ([`IntegratorConfig`])
//! - Initial ghost signals as whitespace tables
//! - Signal-state checkpoints as JSON ([`SignalCheckpoint`])

pub mod error;
pub mod schema;
pub mod signals;

pub use error::{FormatError, Result};
pub use schema::{IntegratorConfig, config_from_json, load_config, save_config};
pub use signals::{
    SignalCheckpoint, load_checkpoint, load_signal_table, read_signal_table, save_checkpoint,
    save_signal_table, write_signal_table,
};
