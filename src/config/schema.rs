//! Configuration schema for hoard
//!
//! Configuration is stored at `~/.config/hoard/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache mount defaults
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text", "json" or "github"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache mount defaults, used when the command line requests nothing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Modes to detect; `["*"]` detects every mode
    pub detect: Vec<String>,

    /// Modes to enable without detection
    pub modes: Vec<String>,

    /// Paths to mount without a mode
    pub paths: Vec<String>,
}
