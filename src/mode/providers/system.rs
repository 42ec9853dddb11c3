//! System package managers and toolchain installers

use crate::error::{HoardError, HoardResult};
use crate::exec::Cmd;
use crate::mode::providers::{detect_project, has_binary, non_empty_env, query_cache_dir};
use crate::mode::{DetectRequest, ModeProvider, PlanRequest, PlanResult};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const APT_DIR_CACHE: &str = "Dir::Cache";
const APT_DIR_CACHE_ARCHIVES: &str = "Dir::Cache::archives";
const APT_DIR_ETC: &str = "Dir::Etc";
const APT_DIR_ETC_PARTS: &str = "Dir::Etc::parts";

/// `Key "value";` lines of `apt-config dump`
static APT_CONFIG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(.+)\s"(.*)";"#).expect("apt-config line pattern is valid")
});

/// Debian/Ubuntu package archives
#[derive(Debug, Clone, Copy, Default)]
pub struct AptProvider;

impl AptProvider {
    /// Extract the allow-listed keys from `apt-config dump`
    fn parse_dump(output: &str) -> HashMap<&str, &str> {
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| APT_CONFIG_LINE.captures(line))
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str();
                let value = caps.get(2)?.as_str();
                match key {
                    APT_DIR_CACHE | APT_DIR_CACHE_ARCHIVES | APT_DIR_ETC | APT_DIR_ETC_PARTS => {
                        Some((key, value))
                    }
                    _ => None,
                }
            })
            .collect()
    }
}

#[async_trait]
impl ModeProvider for AptProvider {
    fn name(&self) -> &str {
        "apt"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        has_binary(req.exec.as_ref(), "apt-config").await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let cmd = Cmd::new("apt-config", ["dump"]);
        let output = req.exec.output_text(&cmd).await?;
        let config = Self::parse_dump(&output);

        let cache = config
            .get(APT_DIR_CACHE)
            .ok_or_else(|| HoardError::missing_key(APT_DIR_CACHE, "apt-config"))?;
        let archives = config
            .get(APT_DIR_CACHE_ARCHIVES)
            .ok_or_else(|| HoardError::missing_key(APT_DIR_CACHE_ARCHIVES, "apt-config"))?;

        let mut result = PlanResult::mounts([format!("/{}/{}", cache, archives)]);

        // The docker-clean hook deletes downloaded archives after every install
        let etc = config.get(APT_DIR_ETC).copied().unwrap_or_default();
        let parts = config.get(APT_DIR_ETC_PARTS).copied().unwrap_or_default();
        if !etc.is_empty() && !parts.is_empty() {
            let script = format!("/{}/{}/docker-clean", etc, parts);
            if req.exec.stat(Path::new(&script)).await?.is_some() {
                result.remove_paths.push(script);
            }
        }

        Ok(result)
    }
}

/// Homebrew downloads
#[derive(Debug, Clone, Copy, Default)]
pub struct BrewProvider;

#[async_trait]
impl ModeProvider for BrewProvider {
    fn name(&self) -> &str {
        "brew"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "brew", &["Brewfile"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let dir = query_cache_dir(req.exec.as_ref(), Cmd::new("brew", ["--cache"])).await?;
        Ok(PlanResult::mounts([dir]))
    }
}

const MISE_CONFIG_FILES: &[&str] = &[
    "mise.toml",
    ".mise.toml",
    ".tool-versions",
    "mise/config.toml",
    ".mise/config.toml",
    ".config/mise.toml",
    ".config/mise/config.toml",
];

/// mise installed tool versions
#[derive(Debug, Clone, Copy, Default)]
pub struct MiseProvider;

impl MiseProvider {
    fn data_dir() -> HoardResult<PathBuf> {
        if let Some(dir) = non_empty_env("MISE_DATA_DIR") {
            return Ok(PathBuf::from(dir));
        }
        if let Some(xdg) = non_empty_env("XDG_DATA_HOME") {
            return Ok(PathBuf::from(xdg).join("mise"));
        }
        if cfg!(windows) {
            if let Some(local) = non_empty_env("LOCALAPPDATA") {
                return Ok(PathBuf::from(local).join("mise"));
            }
        }

        let home = dirs::home_dir()
            .ok_or_else(|| HoardError::Internal("could not determine home directory".to_string()))?;
        Ok(home.join(".local").join("share").join("mise"))
    }
}

#[async_trait]
impl ModeProvider for MiseProvider {
    fn name(&self) -> &str {
        "mise"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "mise", MISE_CONFIG_FILES).await
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        let dir = Self::data_dir()?;
        Ok(PlanResult::mounts([dir.to_string_lossy()]))
    }
}

/// Nix store and evaluation cache
#[derive(Debug, Clone, Copy, Default)]
pub struct NixProvider;

#[async_trait]
impl ModeProvider for NixProvider {
    fn name(&self) -> &str {
        "nix"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(
            req.exec.as_ref(),
            "nix",
            &["flake.nix", "shell.nix", "default.nix"],
        )
        .await
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        Ok(PlanResult::mounts(["~/.cache/nix", "/nix"]))
    }
}
