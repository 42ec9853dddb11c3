//! Config command - show configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{HoardError, HoardResult};

/// Execute the config command
pub fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> HoardResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
    }

    Ok(())
}

fn show_config(config: &Config) -> HoardResult<()> {
    let toml = toml::to_string_pretty(config)
        .map_err(|e| HoardError::Internal(format!("serializing config: {}", e)))?;
    print!("{}", toml);
    Ok(())
}
