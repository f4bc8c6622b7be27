//! Named Shared-Memory Region
//!
//! A `Region` is the owned handle to one mapping. Dropping it unmaps the
//! memory; the creating side also removes the name so that new readers can no
//! longer discover it.

use crate::error::TransportError;
use crate::platform::Mapping;
use std::ptr;
use tracing::info;

/// Owned handle to a mapped telemetry region
pub struct Region {
    tag: String,
    mapping: Mapping,
}

impl Region {
    /// Create the named region read-write with exactly `size` bytes
    ///
    /// A stale region left under the same name by a crashed writer is taken
    /// over and resized.
    pub fn create(tag: &str, size: usize) -> Result<Self, TransportError> {
        let mapping = Mapping::create(tag, size)?;
        info!("Created shared memory region '{}' ({} bytes)", tag, size);
        Ok(Self {
            tag: tag.to_string(),
            mapping,
        })
    }

    /// Open an existing region read-only, mapping its whole current size
    pub fn open(tag: &str) -> Result<Self, TransportError> {
        let mapping = Mapping::open_read_only(tag)?;
        Ok(Self {
            tag: tag.to_string(),
            mapping,
        })
    }

    /// Region tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Mapped size in bytes
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this handle may write
    pub fn is_writable(&self) -> bool {
        self.mapping.is_writable()
    }

    /// Copy `buf.len()` bytes starting at `offset` out of the region
    pub fn read_into(&self, offset: usize, buf: &mut [u8]) -> Result<(), TransportError> {
        self.check_bounds(offset, buf.len())?;
        let src = self.mapping.as_ptr();
        for (i, byte) in buf.iter_mut().enumerate() {
            // SAFETY: bounds checked above; the source is live mapped memory.
            // The writer process may update it concurrently, so every byte is
            // read volatile: a racing publish can only yield a torn value.
            *byte = unsafe { ptr::read_volatile(src.add(offset + i)) };
        }
        Ok(())
    }

    /// Read `len` bytes at `offset` into a new buffer
    pub fn read_vec(&self, offset: usize, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; len];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// Copy `bytes` into the region at `offset`
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.is_writable() {
            return Err(TransportError::ReadOnly(self.tag.clone()));
        }
        self.check_bounds(offset, bytes.len())?;
        let dst = self.mapping.as_mut_ptr();
        for (i, &byte) in bytes.iter().enumerate() {
            // SAFETY: bounds checked above and the mapping is PROT_WRITE.
            // Readers in other processes poll this memory, hence volatile.
            unsafe { ptr::write_volatile(dst.add(offset + i), byte) };
        }
        Ok(())
    }

    fn check_bounds(&self, offset: usize, len: usize) -> Result<(), TransportError> {
        let size = self.len();
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(()),
            _ => Err(TransportError::OutOfBounds { offset, len, size }),
        }
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("tag", &self.tag)
            .field("len", &self.len())
            .field("writable", &self.is_writable())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::unique_tag;

    #[test]
    fn test_create_write_and_reopen() {
        let tag = unique_tag("region");
        let mut writer = Region::create(&tag, 64).unwrap();
        writer.write_at(8, b"telemetry").unwrap();

        let reader = Region::open(&tag).unwrap();
        assert_eq!(reader.len(), 64);
        assert!(!reader.is_writable());
        assert_eq!(reader.read_vec(8, 9).unwrap(), b"telemetry");
    }

    #[test]
    fn test_open_missing_region() {
        let err = Region::open(&unique_tag("missing")).unwrap_err();
        assert!(matches!(err, TransportError::NotFound(_)));
    }

    #[test]
    fn test_drop_unlinks_name() {
        let tag = unique_tag("unlink");
        drop(Region::create(&tag, 32).unwrap());
        assert!(matches!(Region::open(&tag), Err(TransportError::NotFound(_))));
    }

    #[test]
    fn test_out_of_bounds_access() {
        let tag = unique_tag("bounds");
        let mut region = Region::create(&tag, 16).unwrap();
        assert!(matches!(
            region.write_at(10, &[0u8; 8]),
            Err(TransportError::OutOfBounds { offset: 10, len: 8, size: 16 })
        ));
        assert!(region.read_vec(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_reader_cannot_write() {
        let tag = unique_tag("readonly");
        let _owner = Region::create(&tag, 16).unwrap();
        let mut reader = Region::open(&tag).unwrap();
        assert!(matches!(reader.write_at(0, &[1]), Err(TransportError::ReadOnly(_))));
    }

    #[test]
    fn test_reader_sees_each_overwrite() {
        let tag = unique_tag("overwrite");
        let mut writer = Region::create(&tag, 32).unwrap();
        let reader = Region::open(&tag).unwrap();

        let mut buf = [0u8; 8];
        for value in [1.5f64, -2.25, 1e9] {
            writer.write_at(20, &value.to_le_bytes()).unwrap();
            reader.read_into(20, &mut buf).unwrap();
            assert_eq!(f64::from_le_bytes(buf), value);
        }
        assert_eq!(reader.read_vec(0, 20).unwrap(), vec![0u8; 20]);
    }

    #[test]
    fn test_invalid_tags() {
        assert!(matches!(Region::create("", 8), Err(TransportError::InvalidTag(_))));
        assert!(matches!(Region::create("a/b", 8), Err(TransportError::InvalidTag(_))));
        assert!(matches!(Region::open("nul\0tag"), Err(TransportError::InvalidTag(_))));
    }
}
