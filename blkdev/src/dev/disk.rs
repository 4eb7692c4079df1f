//! Disk device descriptors and the driver-facing I/O-control interface.
//!
//! A [DiskDevice] is either a physical disk, created for a whole medium exposed by a
//! driver, or a logical disk covering a contiguous block range of a physical disk.
//! Logical disks share the handler and driver data of their physical disk and keep it
//! alive through a strong reference; a physical disk has no owner.
//!
//! The use count and the pending-deletion mark live in one atomic word so that a
//! release observes both at once.
use alloc::{boxed::Box, sync::Arc};
use bitflags::bitflags;
use core::{
    any::Any,
    fmt::{Debug, Formatter},
    sync::atomic::{AtomicU32, Ordering},
};
use log::warn;

use crate::{dev::id::DeviceId, error::DriverError};

bitflags! {
    /// Capabilities reported by the driver of a physical disk.
    pub struct DiskCapabilities: u32 {
        /// Multi-sector requests may span contiguous blocks in one transfer.
        const MULTI_SECTOR_CONT = 1 << 0;
        /// The driver honours explicit synchronization requests.
        const SYNC              = 1 << 1;
    }
}

/// Requests the registry sends to a driver.
#[derive(Debug)]
pub enum IoctlRequest<'a> {
    /// Fill in the capabilities of the disk. Sent once when a physical disk is created.
    Capabilities(&'a mut DiskCapabilities),
    /// The physical disk is about to be reclaimed. Sent once, never for logical disks.
    Deleted,
}

/// I/O-control entry point of a block device driver.
pub trait DiskIoctl: Send + Sync + Debug {
    fn ioctl(&self, dd: &DiskDevice, request: IoctlRequest<'_>) -> Result<(), DriverError>;
}

/// Opaque data a driver attaches to its disks.
pub type DriverData = Arc<dyn Any + Send + Sync>;

const DELETED: u32 = 1 << 31;
const USES_MASK: u32 = DELETED - 1;

pub struct DiskDevice {
    id: DeviceId,
    /// [None] for a physical disk.
    physical: Option<Arc<DiskDevice>>,
    start: u64,
    size: u64,
    block_size: u32,
    media_block_size: u32,
    handler: Arc<dyn DiskIoctl>,
    driver_data: Option<DriverData>,
    capabilities: DiskCapabilities,
    name: Option<Box<str>>,
    state: AtomicU32,
}

impl DiskDevice {
    pub(crate) fn new_physical(
        id: DeviceId,
        block_size: u32,
        block_count: u64,
        handler: Arc<dyn DiskIoctl>,
        driver_data: Option<DriverData>,
        name: Option<Box<str>>,
    ) -> DiskDevice {
        let mut dd = DiskDevice {
            id,
            physical: None,
            start: 0,
            size: block_count,
            block_size,
            media_block_size: block_size,
            handler,
            driver_data,
            capabilities: DiskCapabilities::empty(),
            name,
            state: AtomicU32::new(0),
        };
        let mut capabilities = DiskCapabilities::empty();
        if let Err(err) = dd.ioctl(IoctlRequest::Capabilities(&mut capabilities)) {
            warn!("Disk {}: capability query failed ({:?}), assuming none.", id, err);
            capabilities = DiskCapabilities::empty();
        }
        dd.capabilities = capabilities;
        dd
    }

    /// `physical` must be a physical disk and the range must already be validated.
    pub(crate) fn new_logical(
        id: DeviceId,
        physical: Arc<DiskDevice>,
        start: u64,
        block_count: u64,
        name: Option<Box<str>>,
    ) -> DiskDevice {
        DiskDevice {
            id,
            start,
            size: block_count,
            block_size: physical.block_size,
            media_block_size: physical.block_size,
            handler: physical.handler.clone(),
            driver_data: physical.driver_data.clone(),
            capabilities: DiskCapabilities::empty(),
            name,
            state: AtomicU32::new(0),
            physical: Some(physical),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn is_physical(&self) -> bool {
        self.physical.is_none()
    }

    /// Identifier of the physical disk this device belongs to; its own for a physical disk.
    pub fn physical_id(&self) -> DeviceId {
        match &self.physical {
            Some(physical) => physical.id,
            None => self.id,
        }
    }

    /// First block of the device in the physical disk's address space.
    pub fn start_block(&self) -> u64 {
        self.start
    }

    pub fn block_count(&self) -> u64 {
        self.size
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn media_block_size(&self) -> u32 {
        self.media_block_size
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.size * self.block_size as u64
    }

    /// Capabilities of the underlying medium. Logical disks report those of their physical disk.
    pub fn capabilities(&self) -> DiskCapabilities {
        match &self.physical {
            Some(physical) => physical.capabilities,
            None => self.capabilities,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn driver_data(&self) -> Option<&DriverData> {
        self.driver_data.as_ref()
    }

    /// Translate a device-relative block into the physical disk's block address space.
    pub fn to_physical_block(&self, block: u64) -> Option<u64> {
        if block < self.size {
            self.start.checked_add(block)
        } else {
            None
        }
    }

    pub fn use_count(&self) -> u32 {
        self.state.load(Ordering::Acquire) & USES_MASK
    }

    pub fn is_pending_deletion(&self) -> bool {
        self.state.load(Ordering::Acquire) & DELETED != 0
    }

    /// Forward a request to the driver.
    pub fn ioctl(&self, request: IoctlRequest<'_>) -> Result<(), DriverError> {
        self.handler.ioctl(self, request)
    }

    // region: Lifecycle (crate internal)

    /// The physical disk this device belongs to, if it is logical.
    pub(crate) fn owner(&self) -> Option<&Arc<DiskDevice>> {
        self.physical.as_ref()
    }

    pub(crate) fn is_child_of(&self, physical: &Arc<DiskDevice>) -> bool {
        self.physical
            .as_ref()
            .is_some_and(|owner| Arc::ptr_eq(owner, physical))
    }

    /// Take one use. Must only be called with the registry lock held.
    pub(crate) fn acquire(&self) {
        self.state.fetch_add(1, Ordering::AcqRel);
    }

    /// Give back `count` uses and return the remaining count and the deletion mark,
    /// observed atomically.
    pub(crate) fn put(&self, count: u32) -> (u32, bool) {
        let prev = match self.state.fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
            if state & USES_MASK >= count {
                Some(state - count)
            } else {
                None
            }
        }) {
            Ok(prev) => prev,
            Err(prev) => {
                warn!(
                    "Disk {}: releasing {} uses with only {} outstanding.",
                    self.id,
                    count,
                    prev & USES_MASK
                );
                self.state.fetch_and(DELETED, Ordering::AcqRel)
            }
        };
        let remaining = (prev & USES_MASK).saturating_sub(count);
        (remaining, prev & DELETED != 0)
    }

    /// Set the deletion mark. Must only be called with the registry lock held.
    pub(crate) fn mark_deleted(&self) {
        self.state.fetch_or(DELETED, Ordering::AcqRel);
    }

    /// Set the deletion mark unless the device is unused.
    ///
    /// Return `true` if the device was marked, `false` if it has no users and may be
    /// reclaimed right away. A concurrent release either completes before the check, or
    /// observes the mark and finishes the reclamation itself.
    pub(crate) fn mark_deleted_if_used(&self) -> bool {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                if state & USES_MASK == 0 {
                    None
                } else {
                    Some(state | DELETED)
                }
            })
            .is_ok()
    }

    // endregion
}

impl Debug for DiskDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DiskDevice")
            .field("id", &self.id)
            .field("physical", &self.physical_id())
            .field("start", &self.start)
            .field("size", &self.size)
            .field("block_size", &self.block_size)
            .field("capabilities", &self.capabilities())
            .field("name", &self.name)
            .field("uses", &self.use_count())
            .field("deleted", &self.is_pending_deletion())
            .finish_non_exhaustive()
    }
}
