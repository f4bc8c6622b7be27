//! Fixed-Width Signal Names
//!
//! Slot names occupy a NUL-padded 64-byte field. The last byte is always zero
//! so that readers written in C can treat the field as a terminated string.

use std::borrow::Cow;
use std::fmt;

/// Width of the name field inside a slot
pub const NAME_WIDTH: usize = 64;

/// A signal name in its on-wire form
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalName([u8; NAME_WIDTH]);

impl SignalName {
    /// The all-zero name carried by inactive slots
    pub const EMPTY: SignalName = SignalName([0; NAME_WIDTH]);

    /// Encode a name, truncating to `NAME_WIDTH - 1` bytes
    pub fn new(name: &str) -> Self {
        let raw = name.as_bytes();
        let len = raw.len().min(NAME_WIDTH - 1);

        let mut buf = [0u8; NAME_WIDTH];
        buf[..len].copy_from_slice(&raw[..len]);
        Self(buf)
    }

    /// Wrap bytes read from a slot as-is
    pub fn from_bytes(bytes: [u8; NAME_WIDTH]) -> Self {
        Self(bytes)
    }

    /// Raw field bytes
    pub fn as_bytes(&self) -> &[u8; NAME_WIDTH] {
        &self.0
    }

    /// Bytes before the first NUL
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(NAME_WIDTH);
        &self.0[..end]
    }

    /// Decoded name, replacing invalid UTF-8 sequences
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.trimmed())
    }

    /// True when the name decodes to an empty string
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }
}

impl Default for SignalName {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignalName").field(&self.to_str_lossy()).finish()
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

impl From<&str> for SignalName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Encode a name into its fixed-width field
pub fn encode_name(name: &str) -> [u8; NAME_WIDTH] {
    *SignalName::new(name).as_bytes()
}

/// Decode a name field; never fails
///
/// Accepts slices of any length: decoding stops at the first zero byte or
/// the end of the slice, whichever comes first.
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
