//! Monitor settings

use crate::error::StreamError;
use serde::{Deserialize, Serialize};
use shm_transport::protocol::{DEFAULT_CAPACITY, DEFAULT_TAG};
use shm_transport::ProviderSettings;
use signal_history::DEFAULT_MAX_POINTS;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment overrides, e.g. `VOROSIM_MONITOR__READ_HZ=50`
pub const ENV_PREFIX: &str = "VOROSIM_MONITOR";

/// Headless monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Shared memory region tag
    pub tagname: String,

    /// Slot count hint used before the header is read
    pub capacity: u32,

    /// Poll rate in Hz (floored at 1 Hz)
    pub read_hz: f64,

    /// History window per track
    pub max_points: usize,

    /// Signals to plot; every available signal when empty
    pub signals: Vec<String>,

    /// Session file; `./vorosim_config.json` is tried when unset
    pub session_config: Option<PathBuf>,

    /// Directory for the log file; console only when unset
    pub log_dir: Option<PathBuf>,

    /// Seconds between summary log lines
    pub report_every: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tagname: DEFAULT_TAG.to_string(),
            capacity: DEFAULT_CAPACITY,
            read_hz: 100.0,
            max_points: DEFAULT_MAX_POINTS,
            signals: Vec::new(),
            session_config: None,
            log_dir: Some(PathBuf::from("logs")),
            report_every: 1.0,
        }
    }
}

impl MonitorSettings {
    /// Load defaults, then an optional settings file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, StreamError> {
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

    /// Interval between reads
    pub fn read_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.read_hz.max(1.0))
    }

    /// Interval between summary lines
    pub fn report_period(&self) -> Duration {
        Duration::from_secs_f64(self.report_every.max(0.1))
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            tagname: self.tagname.clone(),
            capacity: self.capacity,
        }
    }

    /// Session file to try at startup
    pub fn session_path(&self) -> PathBuf {
        match &self.session_config {
            Some(path) => path.clone(),
            None => crate::session::SessionConfig::default_path(Path::new(".")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.tagname, "VoroSim_Telemetry");
        assert_eq!(settings.max_points, 1000);
        assert_eq!(settings.read_period(), Duration::from_millis(10));
        assert_eq!(settings.session_path(), PathBuf::from("./vorosim_config.json"));
    }

    #[test]
    fn test_rate_floor() {
        let settings = MonitorSettings {
            read_hz: 0.25,
            ..Default::default()
        };
        assert_eq!(settings.read_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("vorosim_monitor_{}.toml", std::process::id()));
        std::fs::write(&path, "tagname = \"Bench\"\nread_hz = 20.0\nsignals = [\"steer\"]\n").unwrap();

        let settings = MonitorSettings::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.provider_settings().tagname, "Bench");
        assert_eq!(settings.read_hz, 20.0);
        assert_eq!(settings.signals, vec!["steer"]);
        assert_eq!(settings.max_points, 1000);
    }
}
