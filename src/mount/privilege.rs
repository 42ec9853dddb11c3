//! Privilege-escalation steps
//!
//! Directories above a mount path often live in root-owned locations. Each
//! missing ancestor is created with `sudo` and handed back to the invoking
//! user, one observable step at a time: check, create, re-own.

use crate::error::HoardResult;
use crate::exec::{Cmd, Executor};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// `uid:gid` of the invoking user
pub fn current_owner() -> String {
    // SAFETY: getuid and getgid cannot fail and have no preconditions
    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    format!("{}:{}", uid, gid)
}

/// All ancestors of `path` from the outermost down to `path` itself
///
/// The filesystem root and `.` are never included.
pub fn ancestors(path: &Path) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = path
        .ancestors()
        .filter(|p| {
            let mut components = p.components();
            match (components.next(), components.next()) {
                (None, _) => false,
                (Some(Component::RootDir), None) | (Some(Component::CurDir), None) => false,
                _ => true,
            }
        })
        .map(Path::to_path_buf)
        .collect();
    result.reverse();
    result
}

/// Hand ownership of `path` to the invoking user
pub async fn chown_self(exec: &dyn Executor, path: &Path) -> HoardResult<()> {
    let path = path.to_string_lossy();
    exec.output(&Cmd::sudo(["chown", &current_owner(), path.as_ref()]))
        .await?;
    Ok(())
}

/// Create every missing ancestor of `path` (inclusive) with elevated
/// privileges, re-owning each new directory to the invoking user
pub async fn sudo_mkdir_p(exec: &dyn Executor, path: &Path) -> HoardResult<()> {
    for dir in ancestors(path) {
        if exec.stat(&dir).await?.is_some() {
            continue;
        }

        debug!(path = %dir.display(), "creating directory");
        let dir_str = dir.to_string_lossy();
        exec.output(&Cmd::sudo(["mkdir", dir_str.as_ref()])).await?;
        chown_self(exec, &dir).await?;
    }

    Ok(())
}
