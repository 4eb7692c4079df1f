//! Synchronization helpers that depend on the platform.

pub mod irq;
