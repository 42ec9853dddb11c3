//! Command and filesystem executor
//!
//! Every subprocess and filesystem call made by the mode providers and the
//! mount orchestrator goes through the [`Executor`] trait, so the same code
//! paths can run against the real system or an in-memory fake.
//!
//! "Not found" is not an error at this boundary: [`Executor::locate_binary`],
//! [`Executor::stat`] and [`Executor::lstat`] return `Ok(None)` instead.

#[cfg(test)]
mod fake;
mod system;

#[cfg(test)]
pub use fake::{Call, FakeExecutor};
pub use system::{parse_df_output, SystemExecutor};

use crate::error::HoardResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cmd {
    /// Program to run, resolved through `PATH`
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

impl Cmd {
    /// Create a new command
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a command that runs with elevated privileges through `sudo`
    pub fn sudo<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("sudo", args)
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Kind of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Dir,
    Symlink,
    Other,
}

/// Result of a successful stat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathInfo {
    pub kind: PathKind,
}

impl PathInfo {
    pub fn file() -> Self {
        Self {
            kind: PathKind::File,
        }
    }

    pub fn dir() -> Self {
        Self {
            kind: PathKind::Dir,
        }
    }

    pub fn symlink() -> Self {
        Self {
            kind: PathKind::Symlink,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == PathKind::Dir
    }

    pub(crate) fn from_file_type(file_type: std::fs::FileType) -> Self {
        let kind = if file_type.is_symlink() {
            PathKind::Symlink
        } else if file_type.is_dir() {
            PathKind::Dir
        } else if file_type.is_file() {
            PathKind::File
        } else {
            PathKind::Other
        };
        Self { kind }
    }
}

/// Human-readable size and usage of the filesystem backing a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total: String,
    pub used: String,
}

/// Abstract command and filesystem interface
///
/// Implementations must be safe to share across the concurrent detection and
/// planning tasks.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Resolve a binary on `PATH`, `None` if it is not installed
    async fn locate_binary(&self, name: &str) -> HoardResult<Option<PathBuf>>;

    /// Run a command and capture its stdout; a non-zero exit is an error
    async fn output(&self, cmd: &Cmd) -> HoardResult<Vec<u8>>;

    /// Stat a path following symlinks, `None` if it does not exist
    async fn stat(&self, path: &Path) -> HoardResult<Option<PathInfo>>;

    /// Stat a path without following symlinks, `None` if it does not exist
    async fn lstat(&self, path: &Path) -> HoardResult<Option<PathInfo>>;

    /// List entry names of a directory
    async fn read_dir(&self, path: &Path) -> HoardResult<Vec<String>>;

    /// Create a directory and all missing parents
    async fn create_dir_all(&self, path: &Path, mode: u32) -> HoardResult<()>;

    /// Write a file, replacing existing content
    async fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> HoardResult<()>;

    /// Remove a path recursively with elevated privileges
    async fn remove_all(&self, path: &Path) -> HoardResult<()>;

    /// Make `to` resolve to the contents of `from`
    async fn mount(&self, from: &Path, to: &Path) -> HoardResult<()>;

    /// Query disk usage of the filesystem holding `path`
    async fn disk_usage(&self, path: &Path) -> HoardResult<DiskUsage>;

    /// Run a command and return its stdout as text
    async fn output_text(&self, cmd: &Cmd) -> HoardResult<String> {
        let stdout = self.output(cmd).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
