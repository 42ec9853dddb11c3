//! Built-in ecosystem providers
//!
//! Detection for most providers requires both the ecosystem's binary on
//! `PATH` and a marker file in the working directory, so a globally
//! installed tool alone does not enable a mode.

mod apple;
mod go;
mod javascript;
mod jvm;
mod lang;
mod python;
mod system;

pub use apple::{CocoapodsProvider, SwiftPmProvider, XcodeProvider};
pub use go::{GoProvider, GolangciLintProvider};
pub use javascript::{BunProvider, DenoProvider, PlaywrightProvider, PnpmProvider, YarnProvider};
pub use jvm::{GradleProvider, MavenProvider};
pub use lang::{ComposerProvider, RubyProvider, RustProvider};
pub use python::{PoetryProvider, PythonProvider, UvProvider};
pub use system::{AptProvider, BrewProvider, MiseProvider, NixProvider};

use crate::error::{HoardError, HoardResult};
use crate::exec::{Cmd, Executor};
use std::path::Path;
use tracing::debug;

/// Whether `binary` resolves on `PATH`
pub(crate) async fn has_binary(exec: &dyn Executor, binary: &str) -> HoardResult<bool> {
    let found = exec.locate_binary(binary).await?.is_some();
    if !found {
        debug!(binary, "binary not found");
    }
    Ok(found)
}

/// Whether any of the marker files exists in the working directory
///
/// Markers are checked in order and the first hit wins; a stat failure other
/// than "not found" is an error.
pub(crate) async fn any_marker(exec: &dyn Executor, markers: &[&str]) -> HoardResult<bool> {
    for marker in markers {
        if exec.stat(Path::new(marker)).await?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Binary on `PATH` plus at least one marker file
pub(crate) async fn detect_project(
    exec: &dyn Executor,
    binary: &str,
    markers: &[&str],
) -> HoardResult<bool> {
    if !has_binary(exec, binary).await? {
        return Ok(false);
    }
    any_marker(exec, markers).await
}

/// Run a command that prints a single cache directory
pub(crate) async fn query_cache_dir(exec: &dyn Executor, cmd: Cmd) -> HoardResult<String> {
    let output = exec.output_text(&cmd).await?;
    non_empty(output.trim(), &cmd)
}

/// Value of an environment variable, treating empty as unset
pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub(crate) fn non_empty(dir: &str, cmd: &Cmd) -> HoardResult<String> {
    if dir.is_empty() {
        return Err(HoardError::EmptyCacheDir(cmd.to_string()));
    }
    Ok(dir.to_string())
}
