//! Collaborators outside the disk subsystem: the naming layer and the buffer cache.

use crate::{
    dev::id::DeviceId,
    error::{CacheError, NameError},
};

/// Binds device names (paths) to identifiers.
pub trait NameService: Sync {
    fn register(&self, name: &str, id: DeviceId) -> Result<(), NameError>;
    /// Best effort: the registry logs failures and carries on.
    fn unregister(&self, name: &str) -> Result<(), NameError>;
}

/// The block buffer cache sitting on top of the registry.
pub trait BlockCache: Sync {
    /// Called once by [crate::DiskRegistry::initialize].
    fn init(&self) -> Result<(), CacheError>;
}

/// A naming layer that accepts every name and remembers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNames;

impl NameService for NoNames {
    fn register(&self, _name: &str, _id: DeviceId) -> Result<(), NameError> {
        Ok(())
    }

    fn unregister(&self, _name: &str) -> Result<(), NameError> {
        Ok(())
    }
}

/// No buffer cache to bring up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl BlockCache for NoCache {
    fn init(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
