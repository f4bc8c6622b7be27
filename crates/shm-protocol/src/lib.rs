//! Shared-Memory Telemetry Wire Format
//!
//! This crate defines the bit-exact layout of the telemetry region shared by
//! the emulator (writer) and any number of providers (readers): a fixed
//! little-endian header followed by a table of fixed-size signal slots.
//!
//! ```text
//! +--------------------+---------+---------+-----+-------------------+
//! | Header (28 bytes)  | Slot 0  | Slot 1  | ... | Slot capacity-1   |
//! +--------------------+---------+---------+-----+-------------------+
//!                       \_ 80 bytes each: name[64] value f64 flags pad
//! ```

mod error;
mod layout;
mod name;

pub use error::FormatError;
pub use layout::{
    decode_header, encode_header, region_size, slot_offset, Header, Slot, SlotFlags,
    HEADER_SIZE, SLOT_SIZE, SLOT_VALUE_OFFSET,
};
pub use name::{decode_name, encode_name, SignalName, NAME_WIDTH};

/// Magic literal at offset 0 of every region
pub const MAGIC: [u8; 4] = *b"VSM1";

/// Protocol version written by the emulator and checked by readers
pub const VERSION: u32 = 1;

/// Slot flag bits
pub mod flags {
    /// Slot holds a live signal
    pub const ACTIVE: u32 = 1;
}

/// Region tag used when none is configured
pub const DEFAULT_TAG: &str = "VoroSim_Telemetry";

/// Slot count used when none is configured
pub const DEFAULT_CAPACITY: u32 = 1024;
