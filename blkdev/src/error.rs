//! Error types of the disk subsystem and of the collaborators it talks to.

use alloc::collections::TryReserveError;
use core::fmt::{Display, Formatter};

/// Result type returned by registry operations.
pub type Result<T> = core::result::Result<T, DiskError>;

// region: Error Types

/// Errors reported by [crate::DiskRegistry] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// Bad geometry, missing I/O-control handler or zero block size.
    InvalidArgument,
    /// The identifier already names a descriptor, live or pending deletion.
    SlotOccupied,
    /// No live descriptor (or no live physical disk) under the identifier.
    NotFound,
    /// Growing the table or allocating a descriptor failed.
    OutOfMemory,
    /// The naming service refused to register the device name.
    NameConflict,
    /// A dependent subsystem (the buffer cache) failed to initialize.
    Unsatisfied,
    /// The registry has not been initialized, or has been shut down.
    NotInitialized,
}

impl Display for DiskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            DiskError::InvalidArgument => "invalid argument",
            DiskError::SlotOccupied => "device identifier already in use",
            DiskError::NotFound => "no such disk device",
            DiskError::OutOfMemory => "out of memory",
            DiskError::NameConflict => "device name could not be registered",
            DiskError::Unsatisfied => "dependent subsystem unavailable",
            DiskError::NotInitialized => "disk registry not initialized",
        };
        f.write_str(msg)
    }
}

impl From<TryReserveError> for DiskError {
    fn from(_: TryReserveError) -> Self {
        DiskError::OutOfMemory
    }
}

impl From<NameError> for DiskError {
    fn from(_: NameError) -> Self {
        DiskError::NameConflict
    }
}

impl From<CacheError> for DiskError {
    fn from(_: CacheError) -> Self {
        DiskError::Unsatisfied
    }
}

/// Errors a driver may return from [crate::DiskIoctl::ioctl].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The request is not implemented by the driver.
    Unsupported,
    /// The device failed to carry out the request.
    Io,
    /// Custom driver-specific information.
    Customized { info: &'static str },
}

/// Errors reported by a [crate::NameService].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    /// The name is already bound to another device.
    Exists,
    /// The name is malformed or its parent does not exist.
    Invalid,
    /// Nothing is registered under the name.
    NotFound,
}

/// Errors reported by a [crate::BlockCache].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// The cache could not allocate its buffers.
    NoMemory,
    /// The cache is misconfigured.
    NotConfigured,
}

// endregion
