//! Counted references to disk descriptors.
//!
//! A [DiskHandle] stands for exactly one use of a descriptor: it is produced by
//! [crate::DiskRegistry::obtain] (or the iteration calls) and must be given back with
//! [crate::DiskRegistry::release]. Handles are not [Clone]; obtain again for another use.
//!
//! The handle keeps the descriptor memory alive, so it stays safe to read even after a
//! forced [crate::DiskRegistry::shutdown]. It does not keep the device *registered*:
//! after release the registry may reclaim it at any time.
use alloc::sync::Arc;
use utils::impl_deref;

use crate::dev::disk::DiskDevice;

#[derive(Debug)]
#[must_use = "a disk handle holds a use and must be given back with `release`"]
pub struct DiskHandle {
    inner: Arc<DiskDevice>,
}
impl_deref!(DiskHandle, DiskDevice);

impl DiskHandle {
    /// The caller must already have taken the use this handle stands for.
    pub(crate) fn new(inner: Arc<DiskDevice>) -> DiskHandle {
        DiskHandle { inner }
    }

    pub(crate) fn into_inner(self) -> Arc<DiskDevice> {
        self.inner
    }
}
