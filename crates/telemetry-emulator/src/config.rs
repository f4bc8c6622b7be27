//! Emulator configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use shm_transport::protocol::{DEFAULT_CAPACITY, DEFAULT_TAG};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment overrides, e.g. `VOROSIM_EMULATOR__HZ=120`
pub const ENV_PREFIX: &str = "VOROSIM_EMULATOR";

/// Signals published when none are configured
pub const DEFAULT_SIGNALS: [&str; 5] = [
    "vehicle.speed_kmh",
    "engine.rpm",
    "throttle",
    "brake",
    "steer",
];

/// Emulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Shared memory region tag
    pub tagname: String,

    /// Number of slots in the region
    pub capacity: u32,

    /// Publish rate in Hz (floored at 1 Hz)
    pub hz: f64,

    /// Replay CSV; synthetic signals are generated when unset or missing
    pub csv_path: Option<PathBuf>,

    /// Signals registered into slots 0.. at startup
    pub signals: Vec<String>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            tagname: DEFAULT_TAG.to_string(),
            capacity: DEFAULT_CAPACITY,
            hz: 60.0,
            csv_path: None,
            signals: DEFAULT_SIGNALS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EmulatorConfig {
    /// Load defaults, then an optional settings file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("signals"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Interval between publishes
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.hz.max(1.0))
    }

    /// Replay file to use, if one is configured and exists
    pub fn replay_path(&self) -> Option<&Path> {
        self.csv_path.as_deref().filter(|p| p.is_file())
    }
}
