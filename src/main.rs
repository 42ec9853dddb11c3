//! Hoard - persistent dependency caches for ephemeral CI workers
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use hoard::cli::{Cli, Commands};
use hoard::config::ConfigManager;
use hoard::error::{HoardError, HoardResult};
use hoard::logging::{self, LogFormat};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> HoardResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    let format = LogFormat::resolve(cli.log_format, &config.general.log_format).map_err(
        |reason| HoardError::ConfigInvalid {
            path: config_manager.path().to_path_buf(),
            reason,
        },
    )?;
    logging::init(cli.verbose, format);

    match cli.command {
        Commands::Cache(args) => hoard::cli::commands::cache(args, &config).await,
        Commands::Config(args) => hoard::cli::commands::config(args, &config, &config_manager),
    }
}
