//! Mount report returned to the caller

use crate::exec::DiskUsage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Result of one mount run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountResponse {
    #[serde(default, skip_serializing_if = "MountResponseInput::is_empty")]
    pub input: MountResponseInput,
    #[serde(default)]
    pub output: MountResponseOutput,
}

/// What was resolved from the request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountResponseInput {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

impl MountResponseInput {
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty() && self.paths.is_empty()
    }
}

/// What was (or, in a dry run, would have been) done
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountResponseOutput {
    pub destructive_mode: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub add_envs: BTreeMap<String, String>,
    /// Absent when the lookup failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_usage: Option<DiskUsage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<MountResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_paths: Vec<String>,
}

impl MountResponseOutput {
    /// Share of mounts whose cache path already existed, in percent
    pub fn cache_hit_rate(&self) -> Option<f64> {
        if self.mounts.is_empty() {
            return None;
        }
        let hits = self.mounts.iter().filter(|m| m.cache_hit).count();
        Some(hits as f64 / self.mounts.len() as f64 * 100.0)
    }
}

/// A single mounted path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountResult {
    /// Originating mode, empty for manual paths
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
    pub cache_path: PathBuf,
    pub mount_path: PathBuf,
    /// Whether the cache path existed before this run
    pub cache_hit: bool,
}
