//! Configuration management for hoard

pub mod schema;

pub use schema::{CacheConfig, Config, GeneralConfig};

use crate::error::{HoardError, HoardResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Environment variable overriding the configured cache root
pub const CACHE_PATH_ENV: &str = "HOARD_CACHE_PATH";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hoard")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> HoardResult<Config> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            debug!(path = %self.config_path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> HoardResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| HoardError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| HoardError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache root from, in order, the command line, `HOARD_CACHE_PATH` and the
/// config file
pub fn resolve_cache_root(flag: Option<PathBuf>, config: &Config) -> Option<PathBuf> {
    flag.filter(|p| !p.as_os_str().is_empty())
        .or_else(|| {
            std::env::var_os(CACHE_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .or_else(|| {
            config
                .cache
                .root
                .clone()
                .filter(|p| !p.as_os_str().is_empty())
        })
}

/// Whether the process runs on a CI worker
///
/// Mounting is destructive, so it only happens by default where the worker
/// is thrown away afterwards.
pub fn is_ci() -> bool {
    ["GITHUB_ACTIONS", "GITLAB_CI"]
        .iter()
        .any(|key| std::env::var(key).map(|v| v == "true").unwrap_or(false))
}
