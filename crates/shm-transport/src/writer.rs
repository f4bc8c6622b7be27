//! Telemetry Writer
//!
//! The producing side of the region. Exactly one writer owns a region: it
//! lays out the header and slot table, assigns each signal a fixed slot at
//! startup and then republishes values in place.

use crate::error::TransportError;
use crate::region::Region;
use shm_protocol::{region_size, slot_offset, Header, Slot, SLOT_VALUE_OFFSET};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Current wall-clock time as Unix seconds
pub fn unix_time_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Owner of a read-write telemetry region
pub struct TelemetryWriter {
    region: Region,
    capacity: u32,
    /// Frames published so far
    counter: u64,
    /// Next index handed out by `add_signal`
    next_index: usize,
    /// Registered signals in slot order
    signals: Vec<(String, usize)>,
}

impl TelemetryWriter {
    /// Create the region and write an empty slot table
    pub fn initialize(tag: &str, capacity: u32) -> Result<Self, TransportError> {
        let mut region = Region::create(tag, region_size(capacity))?;

        let header = Header::new(0, unix_time_secs(), capacity);
        region.write_at(0, &header.encode())?;

        let empty = Slot::inactive().encode();
        for index in 0..capacity as usize {
            region.write_at(slot_offset(index), &empty)?;
        }

        info!("Initialized telemetry region '{}' with {} slots", tag, capacity);

        Ok(Self {
            region,
            capacity,
            counter: 0,
            next_index: 0,
            signals: Vec::new(),
        })
    }

    /// Activate slot `index` under `name`
    ///
    /// Signals are assigned once at startup. Registering an index twice
    /// replaces the earlier signal in that slot.
    pub fn register_signal(&mut self, index: usize, name: &str) -> Result<(), TransportError> {
        if index >= self.capacity as usize {
            return Err(TransportError::SlotOutOfRange {
                index,
                capacity: self.capacity,
            });
        }

        self.region
            .write_at(slot_offset(index), &Slot::active(name, 0.0).encode())?;

        self.signals.retain(|(_, i)| *i != index);
        let pos = self.signals.partition_point(|(_, i)| *i < index);
        self.signals.insert(pos, (name.to_string(), index));
        self.next_index = self.next_index.max(index + 1);

        debug!("Registered signal '{}' in slot {}", name, index);
        metrics::gauge!("vorosim_active_signals").set(self.signals.len() as f64);
        Ok(())
    }

    /// Register `name` in the next unused slot and return its index
    pub fn add_signal(&mut self, name: &str) -> Result<usize, TransportError> {
        let index = self.next_index;
        self.register_signal(index, name)?;
        Ok(index)
    }

    /// Publish one frame
    ///
    /// Only the value field of each registered slot is overwritten; signals
    /// absent from `values` keep their previous value. The header (counter
    /// and timestamp) is rewritten last.
    pub fn publish(&mut self, values: &HashMap<String, f64>) -> Result<(), TransportError> {
        for (name, index) in &self.signals {
            if let Some(value) = values.get(name) {
                self.region
                    .write_at(slot_offset(*index) + SLOT_VALUE_OFFSET, &Slot::encode_value(*value))?;
            }
        }

        let counter = self.counter + 1;
        let header = Header::new(counter, unix_time_secs(), self.capacity);
        self.region.write_at(0, &header.encode())?;
        self.counter = counter;

        metrics::counter!("vorosim_frames_published_total").increment(1);
        Ok(())
    }

    /// Frames published so far
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Slot count of the region
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Region tag
    pub fn tag(&self) -> &str {
        self.region.tag()
    }

    /// Registered `(name, slot)` pairs in slot order
    pub fn signals(&self) -> &[(String, usize)] {
        &self.signals
    }

    /// Release the region; new readers no longer find it
    pub fn close(self) {
        info!("Closing telemetry region '{}' after {} frames", self.tag(), self.counter);
    }

    /// Direct region access for tooling and tests
    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::unique_tag;
    use shm_protocol::{decode_header, HEADER_SIZE, SLOT_SIZE};

    fn header_of(writer: &TelemetryWriter) -> Header {
        let region = Region::open(writer.tag()).unwrap();
        decode_header(&region.read_vec(0, HEADER_SIZE).unwrap()).unwrap()
    }

    fn slot_of(writer: &TelemetryWriter, index: usize) -> Slot {
        let region = Region::open(writer.tag()).unwrap();
        Slot::decode(&region.read_vec(slot_offset(index), SLOT_SIZE).unwrap()).unwrap()
    }

    #[test]
    fn test_initialize_layout() {
        let writer = TelemetryWriter::initialize(&unique_tag("init"), 4).unwrap();
        let header = header_of(&writer);
        assert_eq!(header.counter, 0);
        assert_eq!(header.capacity, 4);
        assert!(header.timestamp > 0.0);
        for i in 0..4 {
            assert!(!slot_of(&writer, i).is_active());
        }
    }

    #[test]
    fn test_register_and_publish() {
        let mut writer = TelemetryWriter::initialize(&unique_tag("publish"), 3).unwrap();
        writer.register_signal(0, "speed").unwrap();
        writer.register_signal(2, "rpm").unwrap();

        let values = HashMap::from([("speed".to_string(), 10.0), ("rpm".to_string(), 2000.0)]);
        writer.publish(&values).unwrap();

        assert_eq!(slot_of(&writer, 0), Slot::active("speed", 10.0));
        assert_eq!(slot_of(&writer, 2), Slot::active("rpm", 2000.0));
        assert!(!slot_of(&writer, 1).is_active());
        assert_eq!(header_of(&writer).counter, 1);
    }

    #[test]
    fn test_counter_increments_by_one() {
        let mut writer = TelemetryWriter::initialize(&unique_tag("counter"), 1).unwrap();
        writer.add_signal("brake").unwrap();

        let mut last = header_of(&writer).counter;
        for _ in 0..25 {
            writer.publish(&HashMap::new()).unwrap();
            let now = header_of(&writer).counter;
            assert_eq!(now, last + 1);
            last = now;
        }
        assert_eq!(writer.counter(), 25);
    }

    #[test]
    fn test_missing_values_keep_previous() {
        let mut writer = TelemetryWriter::initialize(&unique_tag("keep"), 2).unwrap();
        writer.add_signal("a").unwrap();
        writer.add_signal("b").unwrap();

        writer
            .publish(&HashMap::from([("a".to_string(), 1.0), ("b".to_string(), 2.0)]))
            .unwrap();
        writer.publish(&HashMap::from([("a".to_string(), 5.0)])).unwrap();

        assert_eq!(slot_of(&writer, 0).value, 5.0);
        assert_eq!(slot_of(&writer, 1).value, 2.0);
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut writer = TelemetryWriter::initialize(&unique_tag("range"), 2).unwrap();
        writer.add_signal("a").unwrap();
        writer.add_signal("b").unwrap();
        assert!(matches!(
            writer.add_signal("c"),
            Err(TransportError::SlotOutOfRange { index: 2, capacity: 2 })
        ));
    }

    #[test]
    fn test_reregister_replaces_signal() {
        let mut writer = TelemetryWriter::initialize(&unique_tag("rereg"), 2).unwrap();
        writer.register_signal(1, "old").unwrap();
        writer.register_signal(1, "new").unwrap();
        assert_eq!(writer.signals(), &[("new".to_string(), 1)]);
        // next_index already points past slot 1
        assert!(matches!(
            writer.add_signal("next"),
            Err(TransportError::SlotOutOfRange { .. })
        ));
    }
}
