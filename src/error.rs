//! Error types for hoard
//!
//! All modules use `HoardResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hoard operations
pub type HoardResult<T> = Result<T, HoardError>;

/// All errors that can occur in hoard
#[derive(Error, Debug)]
pub enum HoardError {
    // Request validation errors
    #[error("at least one cache mode or path must be specified")]
    NoModesOrPaths,

    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("invalid cache root {path}: {reason}")]
    CacheRootInvalid { path: PathBuf, reason: String },

    #[error("invalid path {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    // Provider errors
    #[error("{operation} {mode}: {source}")]
    Provider {
        operation: &'static str,
        mode: String,
        #[source]
        source: Box<HoardError>,
    },

    #[error("{key} not found in {command} output")]
    MissingKey { key: String, command: String },

    #[error("empty cache dir from {0}")]
    EmptyCacheDir(String),

    // Mount errors
    #[error("mounting {from} to {to}: {source}")]
    Mount {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: Box<HoardError>,
    },

    #[error("mounting path {path}: {source}")]
    MountPath {
        path: String,
        #[source]
        source: Box<HoardError>,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("looking up {name}: {reason}")]
    BinaryLookup { name: String, reason: String },

    #[error("command failed: {command}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HoardError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a missing key error for structured tool output
    pub fn missing_key(key: impl Into<String>, command: impl Into<String>) -> Self {
        Self::MissingKey {
            key: key.into(),
            command: command.into(),
        }
    }

    /// Wrap a provider failure with the operation and the provider's name
    pub fn provider(operation: &'static str, mode: impl Into<String>, source: HoardError) -> Self {
        Self::Provider {
            operation,
            mode: mode.into(),
            source: Box::new(source),
        }
    }

    /// Name of the provider that caused this error, if any
    pub fn mode(&self) -> Option<&str> {
        match self {
            Self::Provider { mode, .. } => Some(mode),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoModesOrPaths => Some("Pass --detect '*', --mode <name> or --path <dir>"),
            Self::UnknownMode(_) => Some("Run: hoard cache modes"),
            Self::CacheRootInvalid { .. } => {
                Some("Set --cache-root or HOARD_CACHE_PATH to an existing directory")
            }
            _ => None,
        }
    }
}
