//! Streaming Error Types

use shm_transport::TransportError;
use thiserror::Error;

/// Errors raised by the streaming consumer
#[derive(Debug, Error)]
pub enum StreamError {
    /// Provider operation failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No provider is selected
    #[error("No provider selected")]
    NoProvider,

    /// Session names a provider this build does not know
    #[error("Unknown provider target '{0}'")]
    UnknownTarget(String),

    /// No plot with this key
    #[error("Unknown plot '{0}'")]
    UnknownPlot(String),

    /// Color is not `#RRGGBB`
    #[error("Invalid color '{0}' (expected #RRGGBB)")]
    InvalidColor(String),

    /// File access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file is not valid JSON for the schema
    #[error("Session config error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings could not be loaded
    #[error("Invalid monitor settings: {0}")]
    Settings(#[from] config::ConfigError),

    /// Global subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}
