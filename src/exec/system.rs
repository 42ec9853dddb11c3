//! Executor backed by the real operating system

use crate::error::{HoardError, HoardResult};
use crate::exec::{Cmd, DiskUsage, Executor, PathInfo};
use crate::mount;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Executor that shells into the host system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Create a new system executor
    pub fn new() -> Self {
        Self
    }

    /// Whether `path` is missing or an empty directory
    async fn is_empty_dir(path: &Path) -> HoardResult<bool> {
        let mut entries = match fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => {
                return Err(HoardError::io(
                    format!("checking mount path content {}", path.display()),
                    e,
                ))
            }
        };

        let first = entries
            .next_entry()
            .await
            .map_err(|e| HoardError::io(format!("reading {}", path.display()), e))?;
        Ok(first.is_none())
    }
}

#[async_trait]
impl Executor for SystemExecutor {
    async fn locate_binary(&self, name: &str) -> HoardResult<Option<PathBuf>> {
        match which::which(name) {
            Ok(path) => Ok(Some(path)),
            Err(which::Error::CannotFindBinaryPath) => Ok(None),
            Err(e) => Err(HoardError::BinaryLookup {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn output(&self, cmd: &Cmd) -> HoardResult<Vec<u8>> {
        debug!(command = %cmd, "executing");

        // Dropping the future (task abort on a sibling failure) kills the child.
        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HoardError::command_failed(cmd.to_string(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HoardError::command_exec(cmd.to_string(), stderr.trim()));
        }

        Ok(output.stdout)
    }

    async fn stat(&self, path: &Path) -> HoardResult<Option<PathInfo>> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(Some(PathInfo::from_file_type(meta.file_type()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HoardError::io(format!("stat {}", path.display()), e)),
        }
    }

    async fn lstat(&self, path: &Path) -> HoardResult<Option<PathInfo>> {
        match fs::symlink_metadata(path).await {
            Ok(meta) => Ok(Some(PathInfo::from_file_type(meta.file_type()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HoardError::io(format!("lstat {}", path.display()), e)),
        }
    }

    async fn read_dir(&self, path: &Path) -> HoardResult<Vec<String>> {
        let mut entries = fs::read_dir(path)
            .await
            .map_err(|e| HoardError::io(format!("reading directory {}", path.display()), e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| HoardError::io(format!("reading directory {}", path.display()), e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn create_dir_all(&self, path: &Path, mode: u32) -> HoardResult<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(mode);
        #[cfg(not(unix))]
        let _ = mode;

        builder
            .create(path)
            .await
            .map_err(|e| HoardError::io(format!("creating directory {}", path.display()), e))
    }

    async fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> HoardResult<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(mode);
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options
            .open(path)
            .await
            .map_err(|e| HoardError::io(format!("opening {}", path.display()), e))?;
        file.write_all(data)
            .await
            .map_err(|e| HoardError::io(format!("writing {}", path.display()), e))?;
        file.flush()
            .await
            .map_err(|e| HoardError::io(format!("flushing {}", path.display()), e))
    }

    async fn remove_all(&self, path: &Path) -> HoardResult<()> {
        let path = path.to_string_lossy();
        self.output(&Cmd::sudo(["rm", "-rf", path.as_ref()]))
            .await
            .map(|_| ())
    }

    async fn mount(&self, from: &Path, to: &Path) -> HoardResult<()> {
        if !Self::is_empty_dir(to).await? {
            debug!(path = %to.display(), "mount path will be overwritten");
        }

        let strategy = mount::platform_strategy();
        debug!(
            from = %from.display(),
            to = %to.display(),
            strategy = strategy.strategy_name(),
            "mounting path"
        );

        // Cache path creation is a no-op when it already exists
        self.create_dir_all(from, 0o755).await?;

        strategy.mount(self, from, to).await
    }

    async fn disk_usage(&self, path: &Path) -> HoardResult<DiskUsage> {
        let path = path.to_string_lossy();
        let output = self.output_text(&Cmd::new("df", ["-h", path.as_ref()])).await?;
        parse_df_output(&output)
    }
}

/// Parse `df -h <path>` output into total and used sizes
pub fn parse_df_output(output: &str) -> HoardResult<DiskUsage> {
    let mut lines = output.trim().lines();
    let data = lines
        .nth(1)
        .ok_or_else(|| HoardError::Internal("unexpected df output: missing data line".into()))?;

    let columns: Vec<&str> = data.split_whitespace().collect();
    if columns.len() < 3 {
        return Err(HoardError::Internal(
            "unexpected df output: insufficient columns".into(),
        ));
    }

    Ok(DiskUsage {
        total: columns[1].to_string(),
        used: columns[2].to_string(),
    })
}
