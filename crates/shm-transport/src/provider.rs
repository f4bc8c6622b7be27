//! Telemetry Providers
//!
//! A provider is any backend a streaming consumer can poll for frames. The
//! shared-memory reader is the only backend today; consumers select one by
//! `ProviderKind` and talk to it through the `TelemetryProvider` trait.

use crate::error::TransportError;
use crate::reader::TelemetryReader;
use crate::Frame;
use serde::{Deserialize, Serialize};
use shm_protocol::{DEFAULT_CAPACITY, DEFAULT_TAG};
use std::fmt;

/// Capability set shared by all telemetry backends
pub trait TelemetryProvider: Send {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Open the backend
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Close the backend; idempotent
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// `(counter, timestamp)` of the latest published frame
    fn read_header(&self) -> Result<(u64, f64), TransportError>;

    /// Sorted names of the available signals
    fn list_signals(&mut self) -> Result<Vec<String>, TransportError>;

    /// Current value of every available signal
    fn read_frame(&mut self) -> Result<Frame, TransportError>;
}

/// Shared-memory backend fed by the emulator
pub struct SharedMemoryProvider {
    reader: TelemetryReader,
}

impl SharedMemoryProvider {
    pub fn new(tag: &str, capacity: u32) -> Self {
        Self {
            reader: TelemetryReader::new(tag, capacity),
        }
    }

    /// Underlying reader
    pub fn reader(&self) -> &TelemetryReader {
        &self.reader
    }
}

impl TelemetryProvider for SharedMemoryProvider {
    fn name(&self) -> &str {
        ProviderKind::SharedMemory.display_name()
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        self.reader.connect()
    }

    fn disconnect(&mut self) {
        self.reader.disconnect()
    }

    fn is_connected(&self) -> bool {
        self.reader.is_connected()
    }

    fn read_header(&self) -> Result<(u64, f64), TransportError> {
        self.reader.read_header()
    }

    fn list_signals(&mut self) -> Result<Vec<String>, TransportError> {
        self.reader.list_signals()
    }

    fn read_frame(&mut self) -> Result<Frame, TransportError> {
        self.reader.read_frame()
    }
}

/// Selectable provider backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Named shared-memory region written by the emulator
    #[default]
    SharedMemory,
}

impl ProviderKind {
    /// Every backend, in menu order
    pub const ALL: [ProviderKind; 1] = [ProviderKind::SharedMemory];

    /// Name shown to operators and stored in session configs
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::SharedMemory => "Shared Memory Emulator",
        }
    }

    /// Look up a backend by its display name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.display_name() == name)
    }

    /// Build a disconnected provider for this backend
    pub fn build(&self, settings: &ProviderSettings) -> Box<dyn TelemetryProvider> {
        match self {
            ProviderKind::SharedMemory => Box::new(SharedMemoryProvider::new(&settings.tagname, settings.capacity)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Connection parameters handed to `ProviderKind::build`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Region tag
    pub tagname: String,
    /// Slot count hint used before the header is read
    pub capacity: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            tagname: DEFAULT_TAG.to_string(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}
