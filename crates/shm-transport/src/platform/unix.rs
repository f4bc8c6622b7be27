//! POSIX shared memory (`shm_open` + `mmap`)

use crate::error::TransportError;
use std::ffi::CString;
use std::io;
use std::ptr::{self, NonNull};
use tracing::{debug, warn};

/// Owner read/write only
const SHM_MODE: libc::c_uint = 0o600;

/// A live `mmap` of a named POSIX shared memory object
pub(crate) struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
    writable: bool,
    /// Set for the creating side; the object is unlinked on drop
    owned_name: Option<CString>,
}

impl Mapping {
    /// Create (or take over) the object and map it read-write
    pub(crate) fn create(tag: &str, len: usize) -> Result<Self, TransportError> {
        let name = object_name(tag)?;
        let alloc_err = |err: io::Error| TransportError::AllocationFailed {
            tag: tag.to_string(),
            reason: err.to_string(),
        };

        // SAFETY: `name` is a valid NUL-terminated string for the duration of the call.
        let fd = unsafe {
            libc::shm_open(name.as_ptr(), libc::O_CREAT | libc::O_RDWR, SHM_MODE)
        };
        if fd < 0 {
            return Err(alloc_err(io::Error::last_os_error()));
        }

        // SAFETY: `fd` was just opened by us and is closed exactly once below.
        let sized = unsafe { libc::ftruncate(fd, len as libc::off_t) };
        if sized != 0 {
            let err = io::Error::last_os_error();
            unsafe {
                libc::close(fd);
                libc::shm_unlink(name.as_ptr());
            }
            return Err(alloc_err(err));
        }

        let mapped = map(fd, len, libc::PROT_READ | libc::PROT_WRITE);
        // SAFETY: the mapping (if any) keeps the object alive without the descriptor.
        unsafe { libc::close(fd) };

        match mapped {
            Ok(ptr) => {
                debug!("Mapped shared memory {:?} read-write ({} bytes)", name, len);
                Ok(Self {
                    ptr,
                    len,
                    writable: true,
                    owned_name: Some(name),
                })
            }
            Err(err) => {
                unsafe { libc::shm_unlink(name.as_ptr()) };
                Err(alloc_err(err))
            }
        }
    }

    /// Open an existing object and map all of it read-only
    pub(crate) fn open_read_only(tag: &str) -> Result<Self, TransportError> {
        let name = object_name(tag)?;

        // SAFETY: `name` is a valid NUL-terminated string for the duration of the call.
        let fd = unsafe { libc::shm_open(name.as_ptr(), libc::O_RDONLY, 0 as libc::c_uint) };
        if fd < 0 {
            let err = io::Error::last_os_error();
            return Err(match err.raw_os_error() {
                Some(libc::ENOENT) => TransportError::NotFound(tag.to_string()),
                _ => TransportError::Io(err.to_string()),
            });
        }

        let len = match object_len(fd) {
            Ok(len) => len,
            Err(err) => {
                unsafe { libc::close(fd) };
                return Err(TransportError::Io(err.to_string()));
            }
        };

        // The creator has not sized the object yet.
        if len == 0 {
            unsafe { libc::close(fd) };
            return Err(TransportError::NotFound(tag.to_string()));
        }

        let mapped = map(fd, len, libc::PROT_READ);
        // SAFETY: the mapping (if any) keeps the object alive without the descriptor.
        unsafe { libc::close(fd) };

        let ptr = mapped.map_err(|err| TransportError::Io(err.to_string()))?;
        debug!("Mapped shared memory {:?} read-only ({} bytes)", name, len);
        Ok(Self {
            ptr,
            len,
            writable: false,
            owned_name: None,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_writable(&self) -> bool {
        self.writable
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` describe a mapping created by `map` and not yet unmapped.
        let rc = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
        if rc != 0 {
            warn!("munmap failed: {}", io::Error::last_os_error());
        }

        if let Some(name) = self.owned_name.take() {
            // SAFETY: `name` is a valid NUL-terminated string.
            let rc = unsafe { libc::shm_unlink(name.as_ptr()) };
            if rc != 0 {
                warn!("shm_unlink {:?} failed: {}", name, io::Error::last_os_error());
            } else {
                debug!("Unlinked shared memory {:?}", name);
            }
        }
    }
}

// SAFETY: the mapping is plain shared memory with no thread affinity. Mutation
// requires `&mut Mapping`; concurrent cross-process writes are part of the
// protocol and tolerated by readers.
unsafe impl Send for Mapping {}
unsafe impl Sync for Mapping {}

/// POSIX object name for a region tag (`/<tag>`)
fn object_name(tag: &str) -> Result<CString, TransportError> {
    if tag.is_empty() || tag.contains('/') {
        return Err(TransportError::InvalidTag(tag.to_string()));
    }
    CString::new(format!("/{}", tag)).map_err(|_| TransportError::InvalidTag(tag.to_string()))
}

fn object_len(fd: libc::c_int) -> io::Result<usize> {
    // SAFETY: `stat` is plain old data; fstat fills it on success.
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    if unsafe { libc::fstat(fd, &mut st) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(st.st_size as usize)
}

fn map(fd: libc::c_int, len: usize, prot: libc::c_int) -> io::Result<NonNull<u8>> {
    // SAFETY: a fresh shared mapping of an open descriptor; the kernel picks the address.
    let addr = unsafe { libc::mmap(ptr::null_mut(), len, prot, libc::MAP_SHARED, fd, 0) };
    if addr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    NonNull::new(addr.cast::<u8>()).ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))
}
