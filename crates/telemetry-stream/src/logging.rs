//! Console and file logging

use crate::error::StreamError;
use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name for a session started at `started`
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("vorosim_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber
///
/// Always logs to the console. With a `log_dir`, the directory is created and
/// a timestamped file of JSON lines is written alongside; its path is returned.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<PathBuf>, StreamError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(Local::now()));
            let file = File::create(&path)?;
            let layer = fmt::layer().json().with_target(true).with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| StreamError::Logging(e.to_string()))?;

    info!("==== VoroSim started ====");
    if let Some(path) = &log_path {
        info!("Logging to {}", path.display());
    }
    Ok(log_path)
}
