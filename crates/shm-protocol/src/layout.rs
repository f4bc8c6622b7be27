//! Header and Slot Records
//!
//! Byte offsets are fixed and little-endian regardless of host byte order.

use crate::error::FormatError;
use crate::name::{SignalName, NAME_WIDTH};
use crate::{flags, MAGIC, VERSION};
use serde::{Deserialize, Serialize};

/// Header size: magic[4] version u32 counter u64 timestamp f64 capacity u32
pub const HEADER_SIZE: usize = 28;

/// Slot size: name[64] value f64 flags u32 pad u32
pub const SLOT_SIZE: usize = NAME_WIDTH + 16;

/// Offset of the value field inside a slot
pub const SLOT_VALUE_OFFSET: usize = NAME_WIDTH;

const SLOT_FLAGS_OFFSET: usize = NAME_WIDTH + 8;
const SLOT_PAD_OFFSET: usize = NAME_WIDTH + 12;

/// Byte offset of slot `index` from the start of the region
pub fn slot_offset(index: usize) -> usize {
    HEADER_SIZE + index * SLOT_SIZE
}

/// Total region size for `capacity` slots
pub fn region_size(capacity: u32) -> usize {
    HEADER_SIZE + capacity as usize * SLOT_SIZE
}

/// Decoded region header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Protocol version
    pub version: u32,
    /// Frames published since the region was initialized
    pub counter: u64,
    /// Producer wall-clock time of the last publish (Unix seconds)
    pub timestamp: f64,
    /// Number of slots following the header
    pub capacity: u32,
}

impl Header {
    /// Header for the current protocol version
    pub fn new(counter: u64, timestamp: f64, capacity: u32) -> Self {
        Self {
            version: VERSION,
            counter,
            timestamp,
            capacity,
        }
    }

    /// Encode to wire bytes
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        encode_header(self.version, self.counter, self.timestamp, self.capacity)
    }

    /// Decode from wire bytes, checking the magic
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        decode_header(bytes)
    }

    /// Reject versions this build does not speak
    pub fn check_version(&self) -> Result<(), FormatError> {
        if self.version != VERSION {
            return Err(FormatError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Encode a header with the protocol magic
pub fn encode_header(version: u32, counter: u64, timestamp: f64, capacity: u32) -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0..4].copy_from_slice(&MAGIC);
    buf[4..8].copy_from_slice(&version.to_le_bytes());
    buf[8..16].copy_from_slice(&counter.to_le_bytes());
    buf[16..24].copy_from_slice(&timestamp.to_le_bytes());
    buf[24..28].copy_from_slice(&capacity.to_le_bytes());
    buf
}

/// Decode a header, failing on a short buffer or a foreign magic
pub fn decode_header(bytes: &[u8]) -> Result<Header, FormatError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FormatError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        });
    }

    let found = array::<4>(&bytes[0..4]);
    if found != MAGIC {
        return Err(FormatError::BadMagic { found });
    }

    Ok(Header {
        version: u32::from_le_bytes(array(&bytes[4..8])),
        counter: u64::from_le_bytes(array(&bytes[8..16])),
        timestamp: f64::from_le_bytes(array(&bytes[16..24])),
        capacity: u32::from_le_bytes(array(&bytes[24..28])),
    })
}

/// Slot flag word
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SlotFlags(pub u32);

impl SlotFlags {
    /// Flags of a live slot
    pub const ACTIVE: SlotFlags = SlotFlags(flags::ACTIVE);

    /// Flags of an unused slot
    pub const INACTIVE: SlotFlags = SlotFlags(0);

    pub fn is_active(&self) -> bool {
        self.0 & flags::ACTIVE != 0
    }
}

/// One signal record in the slot table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub name: SignalName,
    pub value: f64,
    pub flags: SlotFlags,
    /// Reserved, written as zero
    pub pad: u32,
}

impl Slot {
    /// An active slot holding `name`
    pub fn active(name: &str, value: f64) -> Self {
        Self {
            name: SignalName::new(name),
            value,
            flags: SlotFlags::ACTIVE,
            pad: 0,
        }
    }

    /// An unused slot
    pub fn inactive() -> Self {
        Self {
            name: SignalName::EMPTY,
            value: 0.0,
            flags: SlotFlags::INACTIVE,
            pad: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.flags.is_active()
    }

    /// Encode to wire bytes
    pub fn encode(&self) -> [u8; SLOT_SIZE] {
        let mut buf = [0u8; SLOT_SIZE];
        buf[..NAME_WIDTH].copy_from_slice(self.name.as_bytes());
        buf[SLOT_VALUE_OFFSET..SLOT_FLAGS_OFFSET].copy_from_slice(&self.value.to_le_bytes());
        buf[SLOT_FLAGS_OFFSET..SLOT_PAD_OFFSET].copy_from_slice(&self.flags.0.to_le_bytes());
        buf[SLOT_PAD_OFFSET..SLOT_SIZE].copy_from_slice(&self.pad.to_le_bytes());
        buf
    }

    /// Decode from wire bytes
    ///
    /// Any 80 bytes form a valid slot; only a short buffer is rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < SLOT_SIZE {
            return Err(FormatError::Truncated {
                expected: SLOT_SIZE,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            name: SignalName::from_bytes(array(&bytes[..NAME_WIDTH])),
            value: Self::decode_value(&bytes[SLOT_VALUE_OFFSET..SLOT_FLAGS_OFFSET]),
            flags: SlotFlags(u32::from_le_bytes(array(&bytes[SLOT_FLAGS_OFFSET..SLOT_PAD_OFFSET]))),
            pad: u32::from_le_bytes(array(&bytes[SLOT_PAD_OFFSET..SLOT_SIZE])),
        })
    }

    /// Encode just the value field, for in-place publishes
    pub fn encode_value(value: f64) -> [u8; 8] {
        value.to_le_bytes()
    }

    /// Decode a value field read on its own
    pub fn decode_value(bytes: &[u8]) -> f64 {
        f64::from_le_bytes(array(&bytes[..8]))
    }
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_match_packed_layout() {
        assert_eq!(HEADER_SIZE, 4 + 4 + 8 + 8 + 4);
        assert_eq!(SLOT_SIZE, 80);
        assert_eq!(region_size(3), 28 + 3 * 80);
        assert_eq!(slot_offset(0), HEADER_SIZE);
        assert_eq!(slot_offset(2), HEADER_SIZE + 160);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = Header::new(42, 1_700_000_000.25, 1024);
        let decoded = decode_header(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_bytes_are_little_endian() {
        let bytes = encode_header(1, 0x0102_0304_0506_0708, 0.0, 3);
        assert_eq!(&bytes[0..4], b"VSM1");
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        assert_eq!(&bytes[8..16], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[24..28], &[3, 0, 0, 0]);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = encode_header(1, 0, 0.0, 1);
        bytes[0..4].copy_from_slice(b"NOPE");
        assert_eq!(
            decode_header(&bytes),
            Err(FormatError::BadMagic { found: *b"NOPE" })
        );
    }

    #[test]
    fn test_short_header_rejected() {
        let err = decode_header(&[0u8; 10]).unwrap_err();
        assert_eq!(
            err,
            FormatError::Truncated {
                expected: HEADER_SIZE,
                actual: 10
            }
        );
    }

    #[test]
    fn test_version_check() {
        let header = Header {
            version: 2,
            ..Header::new(0, 0.0, 1)
        };
        assert_eq!(header.check_version(), Err(FormatError::UnsupportedVersion(2)));
        assert!(Header::new(0, 0.0, 1).check_version().is_ok());
    }

    #[test]
    fn test_slot_roundtrip() {
        let slot = Slot::active("vehicle.speed_kmh", 88.5);
        let bytes = slot.encode();
        assert_eq!(&bytes[72..76], &[1, 0, 0, 0]);

        let decoded = Slot::decode(&bytes).unwrap();
        assert_eq!(decoded, slot);
        assert!(decoded.is_active());
        assert_eq!(decoded.name.to_str_lossy(), "vehicle.speed_kmh");
    }

    #[test]
    fn test_inactive_slot_is_zeroed() {
        let bytes = Slot::inactive().encode();
        assert!(bytes.iter().all(|&b| b == 0));
        assert!(!Slot::decode(&bytes).unwrap().is_active());
    }

    #[test]
    fn test_value_only_encoding_matches_slot() {
        let slot = Slot::active("steer", -0.75);
        let bytes = slot.encode();
        assert_eq!(
            &bytes[SLOT_VALUE_OFFSET..SLOT_VALUE_OFFSET + 8],
            &Slot::encode_value(-0.75)
        );
        assert_eq!(Slot::decode_value(&bytes[SLOT_VALUE_OFFSET..]), -0.75);
    }

    #[test]
    fn test_flags_other_bits_ignored() {
        assert!(SlotFlags(0b101).is_active());
        assert!(!SlotFlags(0b100).is_active());
    }
}
