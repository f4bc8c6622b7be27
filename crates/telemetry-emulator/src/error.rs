//! Emulator Error Types

use shm_transport::TransportError;
use thiserror::Error;

/// Startup configuration errors, raised before any region is created
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Replay source has a header but no data rows
    #[error("Replay source has no data rows")]
    EmptySource,

    /// Replay source has no header row
    #[error("Replay source has no header row")]
    NoHeaderRow,

    /// Replay source could not be read
    #[error("Failed to read replay source: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be loaded or deserialized
    #[error("Invalid emulator settings: {0}")]
    Settings(#[from] config::ConfigError),
}

/// Errors from the emulator lifecycle
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
