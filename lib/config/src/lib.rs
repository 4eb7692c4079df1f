//! Compile-time configuration for the disk subsystem.
//! Values are generated from the workspace `flags.json` by the build script,
//! with per-architecture tables overriding the `default` one.

#![no_std]
#![deny(missing_docs)]

/// Constants generated from `flags.json`.
pub mod build_flags {
    include!(concat!(env!("OUT_DIR"), "/build_flags.rs"));
}

pub use build_flags::*;
