//! Symlink strategy for macOS
//!
//! macOS has no unprivileged bind mounts, so the mount path is replaced by a
//! directory symlink pointing into the cache root.

use crate::error::{HoardError, HoardResult};
use crate::exec::{Cmd, Executor};
use crate::mount::privilege::{current_owner, sudo_mkdir_p};
use crate::mount::MountStrategy;
use async_trait::async_trait;
use std::path::Path;

/// Replaces the mount path with a symlink to the cache path
#[derive(Debug, Clone, Copy, Default)]
pub struct SymlinkMount;

impl SymlinkMount {
    async fn link(&self, exec: &dyn Executor, from: &Path, to: &Path) -> HoardResult<()> {
        let from_str = from.to_string_lossy();
        let to_str = to.to_string_lossy();

        exec.output(&Cmd::sudo(["rm", "-rf", to_str.as_ref()]))
            .await?;
        exec.output(&Cmd::sudo(["ln", "-sfn", from_str.as_ref(), to_str.as_ref()]))
            .await?;

        // -h re-owns the link itself rather than the cache directory
        exec.output(&Cmd::sudo(["chown", "-h", &current_owner(), to_str.as_ref()]))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MountStrategy for SymlinkMount {
    async fn mount(&self, exec: &dyn Executor, from: &Path, to: &Path) -> HoardResult<()> {
        if let Some(parent) = to.parent() {
            sudo_mkdir_p(exec, parent).await?;
        }

        self.link(exec, from, to)
            .await
            .map_err(|e| HoardError::Mount {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source: Box::new(e),
            })
    }

    fn strategy_name(&self) -> &'static str {
        "symlink"
    }
}
