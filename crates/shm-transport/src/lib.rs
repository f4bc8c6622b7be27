//! Shared-Memory Telemetry Transport
//!
//! Single-writer, multi-reader transport over a named memory-mapped region.
//! There is no lock or handshake between the two sides: the writer overwrites
//! slot values and then the header, and readers poll on their own schedule.
//! A reader may therefore observe a torn frame; `TelemetryReader::read_frame_consistent`
//! narrows that window for consumers that care.

mod error;
mod platform;
mod provider;
mod reader;
mod region;
mod writer;

pub use error::TransportError;
pub use provider::{ProviderKind, ProviderSettings, SharedMemoryProvider, TelemetryProvider};
pub use reader::{FrameSnapshot, TelemetryReader};
pub use region::Region;
pub use writer::{unix_time_secs, TelemetryWriter};

pub use shm_protocol as protocol;

use std::collections::HashMap;

/// Signal name to current value
pub type Frame = HashMap<String, f64>;
