//! Telemetry Emulator
//!
//! Producer process for the shared-memory transport. Registers a fixed set
//! of signals into the region at startup and republishes their values at a
//! fixed rate, replaying a CSV file or generating synthetic waveforms.

mod config;
mod error;
mod runner;
mod source;

pub use crate::config::{EmulatorConfig, DEFAULT_SIGNALS, ENV_PREFIX};
pub use error::{ConfigError, EmulatorError};
pub use runner::Emulator;
pub use source::{ReplaySource, Row, SyntheticSource, ValueSource};

use tracing_subscriber::EnvFilter;

/// Initialize console logging (`RUST_LOG` overrides the `info` default)
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
