//! Public surface of the disk subsystem.
//!
//! [DiskRegistry] owns the device table behind a [ProtectedLock]. Structural operations
//! (create, delete, initialize, shutdown, the tail of a release) take the lock and hold
//! the protected flag for their whole duration. Lookups take the fast path: with local
//! interrupts masked they test the flag and, if it is clear, grab the table with a
//! non-spinning try-lock. Only when that fails do they fall back to the full lock.
//!
//! The registry is `const`-constructible so it can live in a `static`:
//!
//! ```
//! use blkdev::{DiskRegistry, NoCache, NoNames, sync::irq::NoInterrupts};
//!
//! static DISKS: DiskRegistry = DiskRegistry::new(&NoNames, &NoCache, &NoInterrupts);
//!
//! DISKS.initialize().unwrap();
//! assert!(DISKS.is_initialized());
//! DISKS.shutdown();
//! ```
use alloc::sync::Arc;
use log::info;

use crate::{
    debug_ex,
    dev::{
        disk::{DiskDevice, DiskIoctl, DriverData},
        handle::DiskHandle,
        id::DeviceId,
        lifecycle,
        services::{BlockCache, NameService},
        table::DiskTable,
    },
    error::{DiskError, Result},
    mutex::ProtectedLock,
    sync::irq::{InterruptControl, IrqGuard},
};

pub struct DiskRegistry {
    table: ProtectedLock<Option<DiskTable>>,
    names: &'static dyn NameService,
    cache: &'static dyn BlockCache,
    irq: &'static dyn InterruptControl,
}

impl DiskRegistry {
    pub const fn new(
        names: &'static dyn NameService,
        cache: &'static dyn BlockCache,
        irq: &'static dyn InterruptControl,
    ) -> DiskRegistry {
        DiskRegistry {
            table: ProtectedLock::new(None),
            names,
            cache,
            irq,
        }
    }

    // region: Initialization

    /// Allocate the device table and bring up the buffer cache.
    ///
    /// Calling it again on an initialized registry does nothing. On failure nothing is
    /// left allocated: [DiskError::OutOfMemory] if the table could not be allocated,
    /// [DiskError::Unsatisfied] if the cache failed to initialize.
    pub fn initialize(&self) -> Result<()> {
        let mut guard = self.table.lock();
        if guard.is_some() {
            return Ok(());
        }
        let table = DiskTable::new(config::DISKTAB_INITIAL_SIZE, config::MINOR_TABLE_INITIAL_SIZE)?;
        self.cache.init().map_err(|err| {
            log::error!("Buffer cache failed to initialize: {:?}.", err);
            DiskError::from(err)
        })?;
        *guard = Some(table);
        info!("Disk registry initialized.");
        Ok(())
    }

    /// Tear everything down, reclaiming every descriptor whatever its use count.
    ///
    /// Handles still held stay readable but no longer refer to a registered device.
    pub fn shutdown(&self) {
        let mut guard = self.table.lock();
        if let Some(mut table) = guard.take() {
            lifecycle::reclaim_all(&mut table, self.names);
            info!("Disk registry shut down.");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.table.lock().is_some()
    }

    // endregion

    // region: Creation and deletion

    /// Register a physical disk of `block_count` blocks of `block_size` bytes.
    ///
    /// The driver is asked for its capabilities through `handler`; a failed query is
    /// taken as "no capabilities". If `name` is given it is registered with the naming
    /// service, and the creation fails with [DiskError::NameConflict] if that is refused.
    pub fn create_physical(
        &self,
        id: DeviceId,
        block_size: u32,
        block_count: u64,
        handler: Option<Arc<dyn DiskIoctl>>,
        driver_data: Option<DriverData>,
        name: Option<&str>,
    ) -> Result<()> {
        let handler = handler.ok_or(DiskError::InvalidArgument)?;
        if block_size == 0 {
            return Err(DiskError::InvalidArgument);
        }
        let mut guard = self.table.lock();
        let table = guard.as_mut().ok_or(DiskError::NotInitialized)?;
        lifecycle::create_physical(
            table,
            self.names,
            id,
            block_size,
            block_count,
            handler,
            driver_data,
            name,
        )
    }

    /// Register a logical disk covering blocks `[start, start + block_count)` of the
    /// physical disk `physical_id`.
    ///
    /// Fails with [DiskError::NotFound] if `physical_id` is not a live physical disk and
    /// with [DiskError::InvalidArgument] if the range is empty or does not fit.
    pub fn create_logical(
        &self,
        id: DeviceId,
        physical_id: DeviceId,
        start: u64,
        block_count: u64,
        name: Option<&str>,
    ) -> Result<()> {
        let mut guard = self.table.lock();
        let table = guard.as_mut().ok_or(DiskError::NotInitialized)?;
        lifecycle::create_logical(table, self.names, id, physical_id, start, block_count, name)
    }

    /// Delete a device. Deleting a physical disk also deletes every logical disk on it.
    ///
    /// Devices still in use are only marked; the last [DiskRegistry::release] reclaims them.
    pub fn delete(&self, id: DeviceId) -> Result<()> {
        let mut guard = self.table.lock();
        let table = guard.as_mut().ok_or(DiskError::NotInitialized)?;
        lifecycle::delete(table, self.names, id)
    }

    // endregion

    // region: Lookup

    /// Run a read-only lookup, on the fast path if no structural operation is in flight.
    fn lookup<R>(&self, f: impl FnOnce(&DiskTable) -> Option<R>) -> Option<R> {
        {
            let _irq = IrqGuard::new(self.irq);
            if let Some(guard) = self.table.try_lock_unprotected() {
                return match &*guard {
                    Some(table) => f(table),
                    None => None,
                };
            }
        }
        let guard = self.table.lock();
        match &*guard {
            Some(table) => f(table),
            None => None,
        }
    }

    /// Take a use of the device `id`.
    ///
    /// Return [None] if there is no such device or it is pending deletion.
    pub fn obtain(&self, id: DeviceId) -> Option<DiskHandle> {
        self.lookup(|table| lifecycle::acquire(table, id))
            .map(DiskHandle::new)
    }

    /// Give back a use taken by [DiskRegistry::obtain] or the iteration calls.
    ///
    /// If this was the last use of a device pending deletion, the device is reclaimed.
    pub fn release(&self, dd: DiskHandle) {
        let dd: Arc<DiskDevice> = dd.into_inner();
        let (remaining, deleted) = {
            let _irq = IrqGuard::new(self.irq);
            dd.put(1)
        };
        if remaining != 0 || !deleted {
            return;
        }
        let mut guard = self.table.lock();
        if let Some(table) = guard.as_mut() {
            // Someone else may have reclaimed it between the put and the lock.
            if table.holds(&dd) {
                debug_ex!("Last use of deleted disk {} released.", dd.id());
                lifecycle::cleanup(table, self.names, &dd);
            }
        }
    }

    /// Take a use of the live device with the smallest identifier.
    pub fn first(&self) -> Option<DiskHandle> {
        self.lookup(|table| lifecycle::acquire_from(table, DeviceId::new(0, 0)))
            .map(DiskHandle::new)
    }

    /// Take a use of the live device with the smallest identifier strictly greater than `id`.
    ///
    /// [None] marks the end of the table, not an error.
    pub fn next(&self, id: DeviceId) -> Option<DiskHandle> {
        let from = id.successor()?;
        self.lookup(|table| lifecycle::acquire_from(table, from))
            .map(DiskHandle::new)
    }

    /// Walk the live devices in ascending identifier order.
    pub fn iter(&self) -> DiskIter<'_> {
        DiskIter {
            registry: self,
            cursor: None,
            finished: false,
        }
    }

    // endregion
}

/// Lazy cursor over the registry built on [DiskRegistry::next].
///
/// Every yielded handle holds a use and must be given back with [DiskRegistry::release].
/// The cursor only remembers the last identifier it returned, so devices created behind
/// it are skipped and devices deleted ahead of it are not seen.
pub struct DiskIter<'a> {
    registry: &'a DiskRegistry,
    cursor: Option<DeviceId>,
    finished: bool,
}

impl DiskIter<'_> {
    /// Start over from the smallest identifier.
    pub fn rewind(&mut self) {
        self.cursor = None;
        self.finished = false;
    }
}

impl Iterator for DiskIter<'_> {
    type Item = DiskHandle;

    fn next(&mut self) -> Option<DiskHandle> {
        if self.finished {
            return None;
        }
        let dd = match self.cursor {
            None => self.registry.first(),
            Some(id) => self.registry.next(id),
        };
        match &dd {
            Some(dd) => self.cursor = Some(dd.id()),
            None => self.finished = true,
        }
        dd
    }
}
