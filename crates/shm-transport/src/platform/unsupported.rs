//! Fallback for hosts without named shared memory

use crate::error::TransportError;

/// Never constructed; every entry point reports the platform as unsupported
pub(crate) struct Mapping {
    _private: (),
}

impl Mapping {
    pub(crate) fn create(_tag: &str, _len: usize) -> Result<Self, TransportError> {
        Err(TransportError::PlatformUnsupported)
    }

    pub(crate) fn open_read_only(_tag: &str) -> Result<Self, TransportError> {
        Err(TransportError::PlatformUnsupported)
    }

    pub(crate) fn len(&self) -> usize {
        0
    }

    pub(crate) fn is_writable(&self) -> bool {
        false
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        std::ptr::null()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        std::ptr::null_mut()
    }
}
