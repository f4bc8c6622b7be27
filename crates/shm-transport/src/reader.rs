//! Telemetry Reader
//!
//! Opens a region created by the emulator, validates its header and maps
//! signal names to slots. The slot index is rebuilt before every frame read so
//! that signals activated after connect show up without reconnecting.

use crate::error::TransportError;
use crate::region::Region;
use crate::Frame;
use shm_protocol::{decode_header, region_size, slot_offset, Header, Slot, HEADER_SIZE, SLOT_SIZE, SLOT_VALUE_OFFSET};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A frame read together with the headers observed around it
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    /// Counter read after the scan
    pub counter: u64,
    /// Producer timestamp read after the scan
    pub timestamp: f64,
    /// Signal values
    pub values: Frame,
    /// False if the writer published during every scan attempt
    pub consistent: bool,
}

/// Read-only client of a telemetry region
pub struct TelemetryReader {
    tag: String,
    /// Requested before connecting, taken from the header afterwards
    capacity: u32,
    region: Option<Region>,
    index: HashMap<String, usize>,
}

impl TelemetryReader {
    /// Create a disconnected reader; `capacity` is only a hint until connect
    pub fn new(tag: &str, capacity: u32) -> Self {
        Self {
            tag: tag.to_string(),
            capacity,
            region: None,
            index: HashMap::new(),
        }
    }

    /// Open and validate the region
    ///
    /// On any failure no handle is left open.
    pub fn connect(&mut self) -> Result<(), TransportError> {
        self.disconnect();

        let region = Region::open(&self.tag)?;
        let header = Self::decode(&region)?;
        header.check_version()?;

        let expected = region_size(header.capacity);
        if region.len() < expected {
            warn!(
                "Region '{}' is {} bytes but header claims {} slots",
                self.tag,
                region.len(),
                header.capacity
            );
            return Err(TransportError::RegionTooSmall {
                expected,
                actual: region.len(),
            });
        }

        self.capacity = header.capacity;
        self.region = Some(region);
        self.rebuild_index()?;

        info!(
            "Connected to '{}' ({} slots, {} active signals)",
            self.tag,
            self.capacity,
            self.index.len()
        );
        Ok(())
    }

    /// Release the region; safe to call when not connected
    pub fn disconnect(&mut self) {
        if self.region.take().is_some() {
            debug!("Disconnected from '{}'", self.tag);
        }
        self.index.clear();
    }

    /// True while a region handle is open
    pub fn is_connected(&self) -> bool {
        self.region.is_some()
    }

    /// Region tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Working slot count
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Current `(counter, timestamp)`
    pub fn read_header(&self) -> Result<(u64, f64), TransportError> {
        let header = self.header()?;
        Ok((header.counter, header.timestamp))
    }

    /// Full header, decoded fresh
    pub fn header(&self) -> Result<Header, TransportError> {
        Self::decode(self.region()?)
    }

    /// Rescan the slot table into the name index
    ///
    /// Duplicate names resolve to the highest active slot.
    pub fn rebuild_index(&mut self) -> Result<(), TransportError> {
        let region = self.region.as_ref().ok_or(TransportError::NotConnected)?;
        let table = region.read_vec(HEADER_SIZE, self.capacity as usize * SLOT_SIZE)?;

        let mut index = HashMap::new();
        for (i, raw) in table.chunks_exact(SLOT_SIZE).enumerate() {
            let slot = Slot::decode(raw)?;
            if !slot.is_active() || slot.name.is_empty() {
                continue;
            }
            index.insert(slot.name.to_str_lossy().into_owned(), i);
        }

        self.index = index;
        Ok(())
    }

    /// Names of all active signals, sorted
    pub fn list_signals(&mut self) -> Result<Vec<String>, TransportError> {
        self.rebuild_index()?;
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Current value of every active signal
    pub fn read_frame(&mut self) -> Result<Frame, TransportError> {
        self.rebuild_index()?;
        let region = self.region()?;

        let mut frame = Frame::with_capacity(self.index.len());
        let mut raw = [0u8; 8];
        for (name, &i) in &self.index {
            region.read_into(slot_offset(i) + SLOT_VALUE_OFFSET, &mut raw)?;
            frame.insert(name.clone(), Slot::decode_value(&raw));
        }

        metrics::counter!("vorosim_frames_read_total").increment(1);
        Ok(frame)
    }

    /// Frame read bracketed by header reads
    ///
    /// If the counter moved during the scan the scan is repeated once; the
    /// second result is returned either way, flagged inconsistent if the
    /// counter moved again.
    pub fn read_frame_consistent(&mut self) -> Result<FrameSnapshot, TransportError> {
        let mut before = self.header()?.counter;
        let mut attempt = 0;

        loop {
            let values = self.read_frame()?;
            let after = self.header()?;
            let consistent = after.counter == before;

            if consistent || attempt == 1 {
                return Ok(FrameSnapshot {
                    counter: after.counter,
                    timestamp: after.timestamp,
                    values,
                    consistent,
                });
            }

            debug!("Counter moved {} -> {} during scan, retrying", before, after.counter);
            metrics::counter!("vorosim_torn_frame_retries_total").increment(1);
            before = after.counter;
            attempt += 1;
        }
    }

    fn region(&self) -> Result<&Region, TransportError> {
        self.region.as_ref().ok_or(TransportError::NotConnected)
    }

    fn decode(region: &Region) -> Result<Header, TransportError> {
        let mut raw = [0u8; HEADER_SIZE];
        region.read_into(0, &mut raw)?;
        Ok(decode_header(&raw)?)
    }
}

impl std::fmt::Debug for TelemetryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryReader")
            .field("tag", &self.tag)
            .field("capacity", &self.capacity)
            .field("connected", &self.is_connected())
            .field("signals", &self.index.len())
            .finish()
    }
}
