//! Two-level device table: a major-indexed vector of minor-indexed slot vectors.
//!
//! Lookups never allocate. Installing into a slot past the current capacity grows the
//! affected dimension to twice its size, or just enough to fit if that is larger.
//! Growth goes through `try_reserve`, so an allocation failure is reported as
//! [crate::DiskError::OutOfMemory] with every existing entry left in place.
use alloc::{sync::Arc, vec::Vec};
use core::cmp::max;

use crate::{
    dev::{disk::DiskDevice, id::DeviceId},
    error::Result,
};

type Slot = Option<Arc<DiskDevice>>;

#[derive(Debug, Default)]
struct MinorTable {
    slots: Vec<Slot>,
}

#[derive(Debug)]
pub(crate) struct DiskTable {
    majors: Vec<MinorTable>,
    minor_initial: usize,
}

fn grow<T: Default>(vec: &mut Vec<T>, index: usize, initial: usize) -> Result<()> {
    if index < vec.len() {
        return Ok(());
    }
    let old_size = vec.len();
    let new_size = if old_size == 0 { initial } else { 2 * old_size };
    let new_size = max(new_size, index + 1);
    vec.try_reserve_exact(new_size - old_size)?;
    vec.resize_with(new_size, T::default);
    Ok(())
}

impl DiskTable {
    pub fn new(major_initial: usize, minor_initial: usize) -> Result<DiskTable> {
        let mut majors = Vec::new();
        majors.try_reserve_exact(major_initial)?;
        majors.resize_with(major_initial, MinorTable::default);
        Ok(DiskTable {
            majors,
            minor_initial,
        })
    }

    pub fn get(&self, id: DeviceId) -> Option<&Arc<DiskDevice>> {
        self.majors
            .get(id.major as usize)?
            .slots
            .get(id.minor as usize)?
            .as_ref()
    }

    /// The slot for `id`, growing the table as needed.
    pub fn slot_mut(&mut self, id: DeviceId) -> Result<&mut Slot> {
        let major = id.major as usize;
        let minor = id.minor as usize;
        grow(&mut self.majors, major, 0)?;
        let table = &mut self.majors[major];
        grow(&mut table.slots, minor, self.minor_initial)?;
        Ok(&mut table.slots[minor])
    }

    /// Clear the slot of `dd` if it still holds `dd`.
    pub fn remove(&mut self, dd: &Arc<DiskDevice>) -> Option<Arc<DiskDevice>> {
        let id = dd.id();
        let slot = self
            .majors
            .get_mut(id.major as usize)?
            .slots
            .get_mut(id.minor as usize)?;
        if slot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, dd))
        {
            slot.take()
        } else {
            None
        }
    }

    /// Whether the slot of `dd` still holds `dd`.
    pub fn holds(&self, dd: &Arc<DiskDevice>) -> bool {
        self.get(dd.id())
            .is_some_and(|current| Arc::ptr_eq(current, dd))
    }

    /// First occupied slot at or after `from` in `(major, minor)` order that satisfies `accept`.
    pub fn find_from(
        &self,
        from: DeviceId,
        mut accept: impl FnMut(&DiskDevice) -> bool,
    ) -> Option<&Arc<DiskDevice>> {
        let mut major = from.major as usize;
        let mut minor = from.minor as usize;
        while let Some(table) = self.majors.get(major) {
            while let Some(slot) = table.slots.get(minor) {
                if let Some(dd) = slot {
                    if accept(dd) {
                        return Some(dd);
                    }
                }
                minor += 1;
            }
            major += 1;
            minor = 0;
        }
        None
    }

    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.majors
            .iter_mut()
            .flat_map(|table| table.slots.iter_mut())
    }

    /// Take every descriptor out of the table, leaving it empty.
    pub fn drain(&mut self) -> impl Iterator<Item = Arc<DiskDevice>> + '_ {
        self.slots_mut().filter_map(Option::take)
    }

    pub fn major_capacity(&self) -> usize {
        self.majors.len()
    }

    pub fn minor_capacity(&self, major: u32) -> usize {
        self.majors
            .get(major as usize)
            .map_or(0, |table| table.slots.len())
    }
}
