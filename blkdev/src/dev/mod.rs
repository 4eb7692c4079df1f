//! Disk devices: identifiers, descriptors, the device table and the registry built on it.

pub mod disk;
pub mod handle;
pub mod id;
pub mod registry;
pub mod services;

mod lifecycle;
mod table;
