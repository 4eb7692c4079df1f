use core::fmt::{Display, Formatter};

/// Device identifier: `major` names a driver class, `minor` an instance within it.
///
/// Ordering is lexicographic over `(major, minor)`, which is also the order the
/// device table is walked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId {
    pub major: u32,
    pub minor: u32,
}

impl DeviceId {
    pub const fn new(major: u32, minor: u32) -> DeviceId {
        DeviceId { major, minor }
    }

    /// Unpack a raw device number, `major` in the high half and `minor` in the low half.
    pub const fn from_raw(raw: u64) -> DeviceId {
        DeviceId {
            major: (raw >> 32) as u32,
            minor: raw as u32,
        }
    }

    pub const fn into_raw(self) -> u64 {
        ((self.major as u64) << 32) | self.minor as u64
    }

    /// The identifier immediately after this one, or [None] past `(u32::MAX, u32::MAX)`.
    pub fn successor(self) -> Option<DeviceId> {
        self.into_raw().checked_add(1).map(DeviceId::from_raw)
    }
}

impl From<u64> for DeviceId {
    fn from(raw: u64) -> Self {
        DeviceId::from_raw(raw)
    }
}

impl From<DeviceId> for u64 {
    fn from(id: DeviceId) -> Self {
        id.into_raw()
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}
