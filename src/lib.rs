//! Hoard - persistent dependency caches for ephemeral CI workers
//!
//! Detects which package managers and toolchains a project uses, asks each
//! of them where it keeps its caches and mounts those directories from a
//! persistent cache root.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod mode;
pub mod mount;

pub use error::{HoardError, HoardResult};
