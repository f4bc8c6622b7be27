//! Session Config Persistence
//!
//! JSON document holding the selected provider target and each plot's track
//! list. Unknown keys (such as window geometry written by other front ends)
//! are ignored on load.

use crate::error::StreamError;
use crate::plot::PlotConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File picked up from the working directory at startup
pub const DEFAULT_SESSION_FILE: &str = "vorosim_config.json";

/// Saved monitor session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Version of the program that wrote the file
    pub version: String,

    /// Provider display name, e.g. "Shared Memory Emulator"
    pub selected_target: Option<String>,

    /// Plot key ("top", "bottom", ...) to track list
    pub plots: BTreeMap<String, PlotConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            selected_target: None,
            plots: BTreeMap::new(),
        }
    }
}

impl SessionConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, StreamError> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        info!("Loaded configuration: {}", path.display());
        Ok(config)
    }

    /// Write pretty-printed JSON, replacing any existing file
    pub fn save_to_path(&self, path: &Path) -> Result<(), StreamError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// `vorosim_config.json` inside `dir`
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_SESSION_FILE)
    }

    /// Load `path` if it exists
    ///
    /// A missing file is silent; an unreadable one is logged and skipped so
    /// the caller keeps its current state.
    pub fn autoload(path: &Path) -> Option<Self> {
        if !path.is_file() {
            return None;
        }

        match Self::load_from_path(path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to load configuration {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::SignalConfig;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vorosim_session_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let mut config = SessionConfig {
            selected_target: Some("Shared Memory Emulator".to_string()),
            ..Default::default()
        };
        config.plots.insert(
            "top".to_string(),
            PlotConfig {
                title: "Graph 1".to_string(),
                signals: vec![SignalConfig {
                    name: "engine.rpm".to_string(),
                    color: "#ff0000".to_string(),
                    visible: true,
                }],
            },
        );

        config.save_to_path(&path).unwrap();
        let loaded = SessionConfig::load_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"window_geometry_b64": "AAAA", "plots": {"bottom": {"signals": [{"name": "brake"}]}}}"#,
        )
        .unwrap();

        assert_eq!(config.selected_target, None);
        assert_eq!(config.plots["bottom"].signals[0].color, "#ffffff");
        assert!(config.plots["bottom"].signals[0].visible);
    }

    #[test]
    fn test_autoload_missing_and_corrupt() {
        let missing = temp_path("missing");
        assert!(SessionConfig::autoload(&missing).is_none());

        let corrupt = temp_path("corrupt");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(SessionConfig::autoload(&corrupt).is_none());
        assert!(matches!(SessionConfig::load_from_path(&corrupt), Err(StreamError::Json(_))));
        fs::remove_file(&corrupt).ok();
    }

    #[test]
    fn test_default_path() {
        assert_eq!(
            SessionConfig::default_path(Path::new("/tmp")),
            PathBuf::from("/tmp/vorosim_config.json")
        );
    }
}
