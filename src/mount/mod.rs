//! Platform mount strategies
//!
//! Makes a cache path appear at the location a tool expects:
//! - Linux and other POSIX systems: bind mount
//! - macOS: directory symlink
//!
//! The strategy is picked at compile time by [`platform_strategy`]; both
//! implementations are always built so they can be exercised against a fake
//! executor on any host.

mod bind;
mod privilege;
mod symlink;

pub use bind::BindMount;
pub use privilege::{ancestors, chown_self, current_owner, sudo_mkdir_p};
pub use symlink::SymlinkMount;

use crate::error::HoardResult;
use crate::exec::Executor;
use async_trait::async_trait;
use std::path::Path;

/// Strategy for making `to` resolve to the contents of `from`
///
/// Implementations must be idempotent and must leave newly created ancestor
/// directories owned by the invoking user.
#[async_trait]
pub trait MountStrategy: Send + Sync {
    /// Materialise the mount
    async fn mount(&self, exec: &dyn Executor, from: &Path, to: &Path) -> HoardResult<()>;

    /// Human-readable strategy name for display
    fn strategy_name(&self) -> &'static str;
}

/// The mount strategy for the platform this binary was built for
#[cfg(target_os = "macos")]
pub fn platform_strategy() -> &'static dyn MountStrategy {
    &SymlinkMount
}

/// The mount strategy for the platform this binary was built for
#[cfg(not(target_os = "macos"))]
pub fn platform_strategy() -> &'static dyn MountStrategy {
    &BindMount
}
