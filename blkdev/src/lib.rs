//! Block device disk registry.
//!
//! Maps `(major, minor)` device identifiers to physical and logical disk
//! descriptors and manages their lifetime: creation, partitioning of a
//! physical disk into logical disks, reference-counted acquisition and
//! cascading deletion. Drivers, the naming layer and the buffer cache are
//! reached through the traits in [dev::services] and [dev::disk].
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod logging;

pub mod dev;
pub mod error;
pub mod mutex;
pub mod sync;

pub use dev::{
    disk::{DiskCapabilities, DiskDevice, DiskIoctl, DriverData, IoctlRequest},
    handle::DiskHandle,
    id::DeviceId,
    registry::{DiskIter, DiskRegistry},
    services::{BlockCache, NameService, NoCache, NoNames},
};
pub use error::{DiskError, Result};
