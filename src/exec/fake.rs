//! In-memory executor for tests
//!
//! Binaries, filesystem entries and command outputs are programmed up front;
//! every call is recorded so tests can assert which side effects happened.

use crate::error::{HoardError, HoardResult};
use crate::exec::{Cmd, DiskUsage, Executor, PathInfo};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// A recorded executor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LocateBinary(String),
    Output(String),
    Stat(PathBuf),
    Lstat(PathBuf),
    ReadDir(PathBuf),
    CreateDirAll(PathBuf),
    WriteFile(PathBuf),
    RemoveAll(PathBuf),
    Mount { from: PathBuf, to: PathBuf },
    DiskUsage(PathBuf),
}

impl Call {
    /// Whether the call mutates the filesystem
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateDirAll(_) | Self::WriteFile(_) | Self::RemoveAll(_) | Self::Mount { .. }
        )
    }
}

#[derive(Default)]
struct FakeState {
    binaries: HashMap<String, PathBuf>,
    broken_binaries: HashSet<String>,
    paths: HashMap<PathBuf, PathInfo>,
    links: HashMap<PathBuf, PathInfo>,
    broken_paths: HashSet<PathBuf>,
    dirs: HashMap<PathBuf, Vec<String>>,
    outputs: HashMap<String, Result<Vec<u8>, String>>,
    files: HashMap<PathBuf, Vec<u8>>,
    disk_usage: Option<DiskUsage>,
    failing_mounts: HashSet<PathBuf>,
    calls: Vec<Call>,
}

/// Programmable executor that never touches the host
#[derive(Default)]
pub struct FakeExecutor {
    state: Mutex<FakeState>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the recorded calls from others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make `name` resolvable on the fake `PATH`
    pub fn with_binary(self, name: &str) -> Self {
        self.state()
            .binaries
            .insert(name.to_string(), PathBuf::from("/usr/bin").join(name));
        self
    }

    /// Make looking up `name` fail with something other than "not found"
    pub fn with_broken_binary(self, name: &str) -> Self {
        self.state().broken_binaries.insert(name.to_string());
        self
    }

    /// Register an existing regular file
    pub fn with_file(self, path: impl Into<PathBuf>) -> Self {
        self.state().paths.insert(path.into(), PathInfo::file());
        self
    }

    /// Register an existing directory
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.state().paths.insert(path.into(), PathInfo::dir());
        self
    }

    /// Register a symlink; `stat` reports the target kind, `lstat` the link
    pub fn with_symlink(self, path: impl Into<PathBuf>, target: PathInfo) -> Self {
        let path = path.into();
        let mut state = self.state();
        state.paths.insert(path.clone(), target);
        state.links.insert(path, PathInfo::symlink());
        drop(state);
        self
    }

    /// Make stat of `path` fail with a permission error
    pub fn with_broken_path(self, path: impl Into<PathBuf>) -> Self {
        self.state().broken_paths.insert(path.into());
        self
    }

    /// Register directory entries returned by `read_dir`
    pub fn with_dir_entries<I, S>(self, path: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries.into_iter().map(Into::into).collect();
        self.state().dirs.insert(path.into(), entries);
        self
    }

    /// Program the stdout of a command, keyed by its rendered command line
    pub fn with_output(self, command: &str, stdout: impl AsRef<[u8]>) -> Self {
        self.state()
            .outputs
            .insert(command.to_string(), Ok(stdout.as_ref().to_vec()));
        self
    }

    /// Program a command to exit non-zero with the given stderr
    pub fn with_failure(self, command: &str, stderr: &str) -> Self {
        self.state()
            .outputs
            .insert(command.to_string(), Err(stderr.to_string()));
        self
    }

    /// Program the disk usage answer; without it `disk_usage` fails
    pub fn with_disk_usage(self, total: &str, used: &str) -> Self {
        self.state().disk_usage = Some(DiskUsage {
            total: total.to_string(),
            used: used.to_string(),
        });
        self
    }

    /// Make mounting onto `to` fail
    pub fn with_failing_mount(self, to: impl Into<PathBuf>) -> Self {
        self.state().failing_mounts.insert(to.into());
        self
    }

    /// All calls recorded so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls that would have mutated the filesystem
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Commands run through `output`, rendered
    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Output(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    /// `(from, to)` pairs passed to `mount`
    pub fn mounts(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Mount { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    /// Content written to `path`, if any
    pub fn written(&self, path: &Path) -> Option<Vec<u8>> {
        self.state().files.get(path).cloned()
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }

    fn check_broken(&self, path: &Path) -> HoardResult<()> {
        if self.state().broken_paths.contains(path) {
            return Err(HoardError::io(
                format!("stat {}", path.display()),
                std::io::Error::new(ErrorKind::PermissionDenied, "permission denied"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn locate_binary(&self, name: &str) -> HoardResult<Option<PathBuf>> {
        self.record(Call::LocateBinary(name.to_string()));
        let state = self.state();
        if state.broken_binaries.contains(name) {
            return Err(HoardError::BinaryLookup {
                name: name.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        Ok(state.binaries.get(name).cloned())
    }

    async fn output(&self, cmd: &Cmd) -> HoardResult<Vec<u8>> {
        let rendered = cmd.to_string();
        self.record(Call::Output(rendered.clone()));
        match self.state().outputs.get(&rendered) {
            Some(Ok(stdout)) => Ok(stdout.clone()),
            Some(Err(stderr)) => Err(HoardError::command_exec(rendered, stderr.clone())),
            None => Err(HoardError::command_exec(rendered, "no fake output programmed")),
        }
    }

    async fn stat(&self, path: &Path) -> HoardResult<Option<PathInfo>> {
        self.record(Call::Stat(path.to_path_buf()));
        self.check_broken(path)?;
        Ok(self.state().paths.get(path).copied())
    }

    async fn lstat(&self, path: &Path) -> HoardResult<Option<PathInfo>> {
        self.record(Call::Lstat(path.to_path_buf()));
        self.check_broken(path)?;
        let state = self.state();
        Ok(state
            .links
            .get(path)
            .or_else(|| state.paths.get(path))
            .copied())
    }

    async fn read_dir(&self, path: &Path) -> HoardResult<Vec<String>> {
        self.record(Call::ReadDir(path.to_path_buf()));
        Ok(self.state().dirs.get(path).cloned().unwrap_or_default())
    }

    async fn create_dir_all(&self, path: &Path, _mode: u32) -> HoardResult<()> {
        self.record(Call::CreateDirAll(path.to_path_buf()));
        let mut state = self.state();
        for ancestor in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            state
                .paths
                .entry(ancestor.to_path_buf())
                .or_insert_with(PathInfo::dir);
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8], _mode: u32) -> HoardResult<()> {
        self.record(Call::WriteFile(path.to_path_buf()));
        let mut state = self.state();
        state.files.insert(path.to_path_buf(), data.to_vec());
        state.paths.insert(path.to_path_buf(), PathInfo::file());
        Ok(())
    }

    async fn remove_all(&self, path: &Path) -> HoardResult<()> {
        self.record(Call::RemoveAll(path.to_path_buf()));
        let mut state = self.state();
        state.paths.retain(|p, _| !p.starts_with(path));
        state.links.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    async fn mount(&self, from: &Path, to: &Path) -> HoardResult<()> {
        self.record(Call::Mount {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        if self.state().failing_mounts.contains(to) {
            return Err(HoardError::command_exec(
                format!("sudo mount --bind {} {}", from.display(), to.display()),
                "mount: permission denied",
            ));
        }
        Ok(())
    }

    async fn disk_usage(&self, path: &Path) -> HoardResult<DiskUsage> {
        self.record(Call::DiskUsage(path.to_path_buf()));
        self.state()
            .disk_usage
            .clone()
            .ok_or_else(|| HoardError::command_exec(format!("df -h {}", path.display()), "df failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn programmed_outputs() {
        let exec = FakeExecutor::new()
            .with_output("brew --cache", "/Users/ci/Library/Caches/Homebrew\n")
            .with_failure("pip cache dir", "pip is disabled");

        let out = exec.output_text(&Cmd::new("brew", ["--cache"])).await.unwrap();
        assert_eq!(out.trim(), "/Users/ci/Library/Caches/Homebrew");

        let err = exec.output(&Cmd::new("pip", ["cache", "dir"])).await.unwrap_err();
        assert!(err.to_string().contains("pip is disabled"));
        assert_eq!(exec.commands(), vec!["brew --cache", "pip cache dir"]);
    }

    #[tokio::test]
    async fn symlink_stat_and_lstat() {
        let exec = FakeExecutor::new().with_symlink("/home/ci/.cache", PathInfo::dir());
        let path = Path::new("/home/ci/.cache");

        assert_eq!(exec.stat(path).await.unwrap(), Some(PathInfo::dir()));
        assert_eq!(exec.lstat(path).await.unwrap(), Some(PathInfo::symlink()));
    }

    #[tokio::test]
    async fn mutations_are_tracked() {
        let exec = FakeExecutor::new();
        exec.stat(Path::new("/a")).await.unwrap();
        exec.create_dir_all(Path::new("/a/b"), 0o755).await.unwrap();
        exec.write_file(Path::new("/a/b/c"), b"x", 0o644).await.unwrap();

        assert_eq!(exec.mutations().len(), 2);
        assert_eq!(exec.stat(Path::new("/a")).await.unwrap(), Some(PathInfo::dir()));
        assert_eq!(exec.written(Path::new("/a/b/c")), Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn broken_path_is_error() {
        let exec = FakeExecutor::new().with_broken_path("/root/secret");
        assert!(exec.stat(Path::new("/root/secret")).await.is_err());
    }
}
