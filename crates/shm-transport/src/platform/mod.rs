//! Platform-specific region mappings

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::Mapping;

#[cfg(not(unix))]
mod unsupported;
#[cfg(not(unix))]
pub(crate) use unsupported::Mapping;
