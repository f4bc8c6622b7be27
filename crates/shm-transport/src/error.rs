//! Transport Error Types

use shm_protocol::FormatError;
use thiserror::Error;

/// Errors raised by region, writer and reader operations
///
/// Every variant is fatal to the operation that raised it, never to the
/// process: polling callers simply try again on their next tick.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Host has no shared-memory-by-name primitive
    #[error("Shared memory regions are not supported on this platform")]
    PlatformUnsupported,

    /// No writer has created the region
    #[error("Shared memory region '{0}' not found")]
    NotFound(String),

    /// Region exists but does not carry the protocol magic
    #[error("Bad mapping magic {found:?}. Is the emulator running?")]
    BadMagic { found: [u8; 4] },

    /// Operation needs an open region
    #[error("Not connected")]
    NotConnected,

    /// Region could not be created or mapped
    #[error("Failed to allocate region '{tag}': {reason}")]
    AllocationFailed { tag: String, reason: String },

    /// Tag cannot be used as a shared-memory object name
    #[error("Invalid region tag '{0}'")]
    InvalidTag(String),

    /// Slot index beyond the region capacity
    #[error("Slot index {index} out of range (capacity {capacity})")]
    SlotOutOfRange { index: usize, capacity: u32 },

    /// Mapped region is shorter than its header claims
    #[error("Region too small: header needs {expected} bytes, mapping has {actual}")]
    RegionTooSmall { expected: usize, actual: usize },

    /// Access past the end of the mapping
    #[error("Access of {len} bytes at offset {offset} exceeds region size {size}")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    /// Write attempted through a read-only mapping
    #[error("Region '{0}' is mapped read-only")]
    ReadOnly(String),

    /// Header could not be decoded
    #[error("Format error: {0}")]
    Format(FormatError),

    /// OS-level failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<FormatError> for TransportError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::BadMagic { found } => TransportError::BadMagic { found },
            other => TransportError::Format(other),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}
