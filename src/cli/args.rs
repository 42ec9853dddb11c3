//! CLI argument definitions using clap derive

use crate::logging::LogFormat;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Hoard - persistent dependency caches for ephemeral CI workers
///
/// Detects the toolchains a project uses and mounts their cache
/// directories from a persistent cache root.
#[derive(Parser, Debug)]
#[command(name = "hoard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "HOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format (defaults to github on GitHub Actions, else config)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage dependency cache mounts
    Cache(CacheArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Plain,
    /// JSON output
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List supported modes and whether they are detected here
    Modes {
        /// Output format
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,
    },

    /// Mount cache directories from the cache root
    Mount(MountArgs),
}

/// Arguments for `cache mount`
#[derive(Parser, Debug)]
pub struct MountArgs {
    /// Modes to detect, comma separated; '*' detects all
    #[arg(long, value_delimiter = ',')]
    pub detect: Vec<String>,

    /// Modes to enable without detection, comma separated
    #[arg(long, value_delimiter = ',')]
    pub mode: Vec<String>,

    /// Paths to mount without a mode, comma separated
    #[arg(long, value_delimiter = ',')]
    pub path: Vec<String>,

    /// Cache root directory (falls back to HOARD_CACHE_PATH, then config)
    #[arg(long)]
    pub cache_root: Option<PathBuf>,

    /// Only report what would be done (default: true outside CI)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub dry_run: Option<bool>,

    /// Write `export KEY="value"` lines for the added environment
    #[arg(long)]
    pub eval_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub output: OutputFormat,
}
