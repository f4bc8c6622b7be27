//! Wire Format Error Types

use thiserror::Error;

/// Errors raised while decoding region bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Leading bytes are not the protocol magic
    #[error("Bad mapping magic {found:?} (expected \"VSM1\")")]
    BadMagic { found: [u8; 4] },

    /// Header carries a version this build does not understand
    #[error("Unsupported protocol version {0}")]
    UnsupportedVersion(u32),

    /// Input shorter than the record being decoded
    #[error("Truncated record: need {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}
