//! Bind-mount strategy for Linux and other POSIX systems

use crate::error::{HoardError, HoardResult};
use crate::exec::{Cmd, Executor};
use crate::mount::privilege::sudo_mkdir_p;
use crate::mount::MountStrategy;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Bind-mounts the cache path over the mount path
#[derive(Debug, Clone, Copy, Default)]
pub struct BindMount;

#[async_trait]
impl MountStrategy for BindMount {
    async fn mount(&self, exec: &dyn Executor, from: &Path, to: &Path) -> HoardResult<()> {
        let to_str = to.to_string_lossy();

        // Only directories can be mounted over
        if let Some(info) = exec.lstat(to).await? {
            if !info.is_dir() {
                debug!(path = %to.display(), "removing non-directory mount path");
                exec.output(&Cmd::sudo(["rm", "-rf", to_str.as_ref()]))
                    .await
                    .map_err(|e| HoardError::Mount {
                        from: from.to_path_buf(),
                        to: to.to_path_buf(),
                        source: Box::new(e),
                    })?;
            }
        }

        sudo_mkdir_p(exec, to).await?;

        let from_str = from.to_string_lossy();
        exec.output(&Cmd::sudo([
            "mount",
            "--bind",
            from_str.as_ref(),
            to_str.as_ref(),
        ]))
        .await
        .map_err(|e| HoardError::Mount {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    fn strategy_name(&self) -> &'static str {
        "bind mount"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{FakeExecutor, PathInfo};
    use crate::mount::current_owner;

    #[tokio::test]
    async fn bind_existing_directory() {
        let exec = FakeExecutor::new()
            .with_dir("/home")
            .with_dir("/home/ci")
            .with_output("sudo mount --bind /cache/home/ci /home/ci", "");

        BindMount
            .mount(&exec, Path::new("/cache/home/ci"), Path::new("/home/ci"))
            .await
            .unwrap();

        assert_eq!(
            exec.commands(),
            vec!["sudo mount --bind /cache/home/ci /home/ci"]
        );
    }

    #[tokio::test]
    async fn bind_creates_missing_ancestors() {
        let owner = current_owner();
        let exec = FakeExecutor::new()
            .with_dir("/nix")
            .with_output("sudo mkdir /nix/store", "")
            .with_output(&format!("sudo chown {} /nix/store", owner), "")
            .with_output("sudo mount --bind /cache/nix/store /nix/store", "");

        BindMount
            .mount(&exec, Path::new("/cache/nix/store"), Path::new("/nix/store"))
            .await
            .unwrap();

        assert_eq!(
            exec.commands(),
            vec![
                "sudo mkdir /nix/store".to_string(),
                format!("sudo chown {} /nix/store", owner),
                "sudo mount --bind /cache/nix/store /nix/store".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn bind_replaces_symlink() {
        let exec = FakeExecutor::new()
            .with_dir("/work")
            .with_symlink("/work/target", PathInfo::dir())
            .with_output("sudo rm -rf /work/target", "")
            .with_output("sudo mount --bind /cache/work/target /work/target", "");

        BindMount
            .mount(&exec, Path::new("/cache/work/target"), Path::new("/work/target"))
            .await
            .unwrap();

        assert_eq!(exec.commands()[0], "sudo rm -rf /work/target");
        assert_eq!(
            exec.commands().last().unwrap(),
            "sudo mount --bind /cache/work/target /work/target"
        );
    }

    #[tokio::test]
    async fn bind_failure_names_both_paths() {
        let exec = FakeExecutor::new()
            .with_dir("/data")
            .with_failure("sudo mount --bind /cache/data /data", "not permitted");

        let err = BindMount
            .mount(&exec, Path::new("/cache/data"), Path::new("/data"))
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("/cache/data"));
        assert!(msg.contains("not permitted"));
    }
}
