//! Cache command - detect modes and mount caches

use crate::cache::{MountRequest, MountResponse, Mounter};
use crate::cli::args::{CacheAction, CacheArgs, MountArgs, OutputFormat};
use crate::config::{self, Config};
use crate::error::{HoardError, HoardResult};
use crate::exec::{Executor, SystemExecutor};
use crate::mode::{default_modes, DetectRequest};
use console::style;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> HoardResult<()> {
    let exec: Arc<dyn Executor> = Arc::new(SystemExecutor::new());

    match args.action {
        CacheAction::Modes { output } => list_modes(exec, output).await,
        CacheAction::Mount(args) => mount(exec, args, config).await,
    }
}

#[derive(Debug, Serialize)]
struct ModesJson {
    modes: BTreeMap<String, ModeStatus>,
}

#[derive(Debug, Serialize)]
struct ModeStatus {
    detected: bool,
}

/// Detect every supported mode and print the result
async fn list_modes(exec: Arc<dyn Executor>, output: OutputFormat) -> HoardResult<()> {
    let modes = default_modes();
    let detected = modes.detect(DetectRequest::new(exec)).await?.names();

    let statuses: BTreeMap<String, ModeStatus> = modes
        .names()
        .into_iter()
        .map(|name| {
            let detected = detected.contains(&name);
            (name, ModeStatus { detected })
        })
        .collect();

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&ModesJson { modes: statuses })?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            for (name, status) in &statuses {
                let marker = if status.detected {
                    style("detected").green().to_string()
                } else {
                    style("-").dim().to_string()
                };
                println!("{:<16} {}", name, marker);
            }
            println!();
            println!("Detected: {} of {} mode(s)", detected.len(), statuses.len());
        }
    }

    Ok(())
}

/// Build the request from flags, falling back to the config file
fn mount_request(args: &MountArgs, config: &Config) -> MountRequest {
    let from_flags = !(args.detect.is_empty() && args.mode.is_empty() && args.path.is_empty());
    let (detect, modes, paths) = if from_flags {
        (&args.detect, &args.mode, &args.path)
    } else {
        debug!("no modes or paths on the command line, using config");
        (&config.cache.detect, &config.cache.modes, &config.cache.paths)
    };

    // Only a lone `*` means "every mode"; anything else is validated by name
    let detect_all_modes = matches!(detect.as_slice(), [only] if only == "*");

    MountRequest {
        detect_all_modes,
        detect_modes: detect.clone(),
        manual_modes: modes.clone(),
        manual_paths: paths.clone(),
    }
}

/// Mount the requested caches
async fn mount(exec: Arc<dyn Executor>, args: MountArgs, config: &Config) -> HoardResult<()> {
    let request = mount_request(&args, config);
    if request.is_empty() {
        return Err(HoardError::NoModesOrPaths);
    }

    let root = config::resolve_cache_root(args.cache_root.clone(), config).unwrap_or_default();
    let dry_run = args.dry_run.unwrap_or(!config::is_ci());

    let mounter = Mounter::new(&root, exec).await?.destructive(!dry_run);
    info!(
        cache_root = %mounter.cache_root().display(),
        dry_run,
        "mounting caches"
    );

    let response = mounter.mount(&request).await?;

    if let Some(path) = &args.eval_file {
        write_eval_file(path, &response.output.add_envs).await?;
    }

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&response)?;
            println!("{}", json);
        }
        OutputFormat::Plain => print_summary(&response, dry_run),
    }

    Ok(())
}

fn print_summary(response: &MountResponse, dry_run: bool) {
    let output = &response.output;
    let none = || style("none").dim().to_string();

    if dry_run {
        println!(
            "{}",
            style("Dry run: nothing was mounted (pass --dry-run=false to mount)").yellow()
        );
    }

    let modes = if response.input.modes.is_empty() {
        none()
    } else {
        response.input.modes.join(", ")
    };
    let paths = if response.input.paths.is_empty() {
        none()
    } else {
        response.input.paths.join(", ")
    };

    println!("{:<16} {}", "Modes:", modes);
    println!("{:<16} {}", "Paths:", paths);
    println!("{:<16} {}", "Mounts:", output.mounts.len());
    if let Some(rate) = output.cache_hit_rate() {
        println!("{:<16} {:.1}%", "Cache hit rate:", rate);
    }
    if let Some(usage) = &output.disk_usage {
        println!("{:<16} {} of {}", "Disk usage:", usage.used, usage.total);
    }

    for mount in &output.mounts {
        let hit = if mount.cache_hit {
            style("hit").green().to_string()
        } else {
            style("miss").dim().to_string()
        };
        println!(
            "  {} -> {} ({})",
            mount.cache_path.display(),
            mount.mount_path.display(),
            hit
        );
    }
}

/// Render environment additions as shell `export` lines
pub fn eval_script(envs: &BTreeMap<String, String>) -> String {
    envs.iter()
        .map(|(key, value)| format!("export {}=\"{}\"\n", key, shell_escape(value)))
        .collect()
}

/// Escape a value for use inside double quotes
fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

async fn write_eval_file(path: &Path, envs: &BTreeMap<String, String>) -> HoardResult<()> {
    if envs.is_empty() {
        debug!(path = %path.display(), "no environment to export, skipping eval file");
        return Ok(());
    }

    fs::write(path, eval_script(envs))
        .await
        .map_err(|e| HoardError::io(format!("writing eval file {}", path.display()), e))?;
    info!(path = %path.display(), count = envs.len(), "wrote eval file");
    Ok(())
}
