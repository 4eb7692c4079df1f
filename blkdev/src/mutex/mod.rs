//! Locks used by the disk subsystem.

mod spin;
pub use self::spin::{ProtectedGuard, ProtectedLock};
