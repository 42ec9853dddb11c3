//! Cache metadata persisted under the cache root

use crate::cache::MountResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Private directory inside the cache root
pub const METADATA_DIR: &str = ".hoard";
/// Metadata file name inside [`METADATA_DIR`]
pub const METADATA_FILE: &str = "cache-metadata.json";

const METADATA_VERSION: u32 = 1;
const METADATA_SOURCE: &str = "hoard";

/// Record of the last destructive mount run
///
/// Rewritten wholesale on every run, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub updated_at: String,
    pub version: u32,
    /// Keyed by cache path
    pub user_request: BTreeMap<String, CacheMetadataEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadataEntry {
    /// Mode that planned the path, `null` for manual paths
    pub cache_framework: Option<String>,
    pub mount_target: Vec<String>,
    pub source: String,
}

impl CacheMetadata {
    /// Build metadata for a set of mounts
    pub fn from_mounts(mounts: &[MountResult], now: DateTime<Utc>) -> Self {
        let mut user_request: BTreeMap<String, CacheMetadataEntry> = BTreeMap::new();

        for mount in mounts {
            let target = mount.mount_path.to_string_lossy().into_owned();
            let entry = user_request
                .entry(mount.cache_path.to_string_lossy().into_owned())
                .or_insert_with(|| CacheMetadataEntry {
                    cache_framework: (!mount.mode.is_empty()).then(|| mount.mode.clone()),
                    mount_target: Vec::new(),
                    source: METADATA_SOURCE.to_string(),
                });
            if !entry.mount_target.contains(&target) {
                entry.mount_target.push(target);
            }
        }

        Self {
            updated_at: now.to_rfc3339_opts(SecondsFormat::Nanos, true),
            version: METADATA_VERSION,
            user_request,
        }
    }
}
