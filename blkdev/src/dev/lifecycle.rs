//! Creation, deletion and reclamation of descriptors.
//!
//! Everything here runs with the registry lock held, which is what makes the
//! `is_pending_deletion` checks and the `acquire` calls race free: the deletion mark is
//! only ever set, and uses only ever taken, under that lock. Uses are given back
//! without it, which is why reclamation decisions go through the atomic state word of
//! [DiskDevice].
use alloc::{boxed::Box, sync::Arc};
use log::{info, warn};

use crate::{
    debug_ex,
    dev::{
        disk::{DiskDevice, DiskIoctl, DriverData, IoctlRequest},
        id::DeviceId,
        services::NameService,
        table::DiskTable,
    },
    error::{DiskError, Result},
};

/// Look up a device that is not pending deletion and take a use of it.
pub(crate) fn acquire(table: &DiskTable, id: DeviceId) -> Option<Arc<DiskDevice>> {
    let dd = table.get(id)?;
    if dd.is_pending_deletion() {
        return None;
    }
    dd.acquire();
    Some(dd.clone())
}

/// First device at or after `from` that is not pending deletion, with a use taken.
pub(crate) fn acquire_from(table: &DiskTable, from: DeviceId) -> Option<Arc<DiskDevice>> {
    let dd = table.find_from(from, |dd| !dd.is_pending_deletion())?;
    dd.acquire();
    Some(dd.clone())
}

fn register_name(
    names: &dyn NameService,
    id: DeviceId,
    name: Option<&str>,
) -> Result<Option<Box<str>>> {
    let Some(name) = name else {
        return Ok(None);
    };
    names.register(name, id).map_err(|err| {
        warn!("Disk {}: could not register name '{}': {:?}.", id, name, err);
        DiskError::from(err)
    })?;
    Ok(Some(Box::from(name)))
}

pub(crate) fn create_physical(
    table: &mut DiskTable,
    names: &dyn NameService,
    id: DeviceId,
    block_size: u32,
    block_count: u64,
    handler: Arc<dyn DiskIoctl>,
    driver_data: Option<DriverData>,
    name: Option<&str>,
) -> Result<()> {
    let slot = table.slot_mut(id)?;
    if slot.is_some() {
        return Err(DiskError::SlotOccupied);
    }
    let name = register_name(names, id, name)?;
    let dd = DiskDevice::new_physical(id, block_size, block_count, handler, driver_data, name);
    info!(
        "Created physical disk {} ({} blocks of {} bytes, capabilities {:?}).",
        id,
        block_count,
        block_size,
        dd.capabilities()
    );
    *slot = Some(Arc::new(dd));
    Ok(())
}

pub(crate) fn create_logical(
    table: &mut DiskTable,
    names: &dyn NameService,
    id: DeviceId,
    physical_id: DeviceId,
    start: u64,
    block_count: u64,
    name: Option<&str>,
) -> Result<()> {
    let physical = table
        .get(physical_id)
        .filter(|dd| dd.is_physical() && !dd.is_pending_deletion())
        .cloned()
        .ok_or(DiskError::NotFound)?;

    let size = physical.block_count();
    match start.checked_add(block_count) {
        Some(end) if start < size && end > start && end <= size => {}
        _ => return Err(DiskError::InvalidArgument),
    }

    let slot = table.slot_mut(id)?;
    if slot.is_some() {
        return Err(DiskError::SlotOccupied);
    }
    let name = register_name(names, id, name)?;

    // Held until the logical disk is reclaimed.
    physical.acquire();
    info!(
        "Created logical disk {} on {} (blocks {}..{}).",
        id,
        physical_id,
        start,
        start + block_count
    );
    *slot = Some(Arc::new(DiskDevice::new_logical(
        id,
        physical,
        start,
        block_count,
        name,
    )));
    Ok(())
}

pub(crate) fn delete(table: &mut DiskTable, names: &dyn NameService, id: DeviceId) -> Result<()> {
    let dd = acquire(table, id).ok_or(DiskError::NotFound)?;
    dd.mark_deleted();
    dd.put(1);
    debug_ex!("Deleting disk {} ({} uses outstanding).", id, dd.use_count());
    cleanup(table, names, &dd);
    Ok(())
}

/// Reclaim whatever a deletion of `dd` has made reclaimable.
///
/// If the physical disk of `dd` is pending deletion, every logical disk on it is either
/// reclaimed (no uses) or marked, and the physical disk follows once its count drops to
/// zero. Otherwise only `dd` itself is reclaimed, and only if it is unused.
pub(crate) fn cleanup(table: &mut DiskTable, names: &dyn NameService, dd: &Arc<DiskDevice>) {
    let physical = match dd.owner() {
        Some(owner) => owner.clone(),
        None => dd.clone(),
    };

    if physical.is_pending_deletion() {
        let mut reclaimed = 0;
        for slot in table.slots_mut() {
            let Some(child) = slot else {
                continue;
            };
            if !child.is_child_of(&physical) || child.mark_deleted_if_used() {
                continue;
            }
            if let Some(child) = slot.take() {
                reclaim(names, &child);
                reclaimed += 1;
            }
        }

        let (remaining, _) = physical.put(reclaimed);
        if remaining == 0 {
            if let Some(physical) = table.remove(&physical) {
                reclaim(names, &physical);
            }
        } else {
            debug_ex!(
                "Disk {} kept until {} uses are released.",
                physical.id(),
                remaining
            );
        }
    } else if dd.use_count() == 0 {
        if let Some(dd) = table.remove(dd) {
            reclaim(names, &dd);
            physical.put(1);
        }
    }
}

/// Notify the driver and the naming layer that `dd` is gone. The slot must already be clear.
pub(crate) fn reclaim(names: &dyn NameService, dd: &DiskDevice) {
    if dd.is_physical() {
        if let Err(err) = dd.ioctl(IoctlRequest::Deleted) {
            warn!("Disk {}: driver rejected deletion notice: {:?}.", dd.id(), err);
        }
    }
    if let Some(name) = dd.name() {
        if let Err(err) = names.unregister(name) {
            warn!("Disk {}: could not unregister '{}': {:?}.", dd.id(), name, err);
        }
    }
    debug_ex!("Reclaimed disk {}.", dd.id());
}

/// Reclaim every descriptor regardless of outstanding uses.
pub(crate) fn reclaim_all(table: &mut DiskTable, names: &dyn NameService) {
    for dd in table.drain() {
        dd.mark_deleted();
        reclaim(names, &dd);
    }
}
