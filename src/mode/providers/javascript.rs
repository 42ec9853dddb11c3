//! JavaScript runtimes and package managers

use crate::error::{HoardError, HoardResult};
use crate::exec::Cmd;
use crate::mode::providers::{detect_project, has_binary, non_empty, non_empty_env, query_cache_dir};
use crate::mode::{DetectRequest, ModeProvider, PlanRequest, PlanResult};
use async_trait::async_trait;
use semver::Version;
use tracing::debug;

/// Bun global install cache
#[derive(Debug, Clone, Copy, Default)]
pub struct BunProvider;

#[async_trait]
impl ModeProvider for BunProvider {
    fn name(&self) -> &str {
        "bun"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "bun", &["bun.lock"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let dir = query_cache_dir(req.exec.as_ref(), Cmd::new("bun", ["pm", "cache"])).await?;
        Ok(PlanResult::mounts([dir]))
    }
}

const DENO_DIR: &str = "denoDir";

/// Deno module cache
#[derive(Debug, Clone, Copy, Default)]
pub struct DenoProvider;

#[async_trait]
impl ModeProvider for DenoProvider {
    fn name(&self) -> &str {
        "deno"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "deno", &["deno.lock"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let output = req.exec.output(&Cmd::new("deno", ["info", "--json"])).await?;
        let info: serde_json::Value = serde_json::from_slice(&output)?;

        let dir = info
            .get(DENO_DIR)
            .and_then(|v| v.as_str())
            .filter(|dir| !dir.is_empty())
            .ok_or_else(|| HoardError::missing_key(DENO_DIR, "deno info"))?;

        Ok(PlanResult::mounts([dir]))
    }
}

const PLAYWRIGHT_BROWSERS_PATH: &str = "PLAYWRIGHT_BROWSERS_PATH";

/// Playwright browser downloads
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaywrightProvider;

impl PlaywrightProvider {
    fn default_browsers_path() -> &'static str {
        if cfg!(target_os = "macos") {
            "~/Library/Caches/ms-playwright"
        } else if cfg!(windows) {
            "%USERPROFILE%\\AppData\\Local\\ms-playwright"
        } else {
            "~/.cache/ms-playwright"
        }
    }
}

#[async_trait]
impl ModeProvider for PlaywrightProvider {
    fn name(&self) -> &str {
        "playwright"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        has_binary(req.exec.as_ref(), "playwright").await
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        let path = non_empty_env(PLAYWRIGHT_BROWSERS_PATH)
            .unwrap_or_else(|| Self::default_browsers_path().to_string());
        Ok(PlanResult::mounts([path]))
    }
}

/// First pnpm release that keeps warnings off stdout with `--loglevel error`
const PNPM_QUIET_STDOUT: Version = Version::new(9, 7, 0);
/// Thin space, `WARN`, thin space
const PNPM_WARNING_PREFIX: &str = "\u{2009}WARN\u{2009}";

/// pnpm content-addressable store
#[derive(Debug, Clone, Copy, Default)]
pub struct PnpmProvider;

impl PnpmProvider {
    /// Older releases print warnings before the version, so only the last
    /// line is considered
    fn parse_version(output: &str) -> Option<Version> {
        let last = output.trim().lines().last()?.trim();
        Version::parse(last.trim_start_matches('v')).ok()
    }

    fn strip_warnings(output: &str) -> String {
        output
            .lines()
            .filter(|line| !line.starts_with(PNPM_WARNING_PREFIX))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl ModeProvider for PnpmProvider {
    fn name(&self) -> &str {
        "pnpm"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "pnpm", &["pnpm-lock.yaml"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let version_output = req
            .exec
            .output_text(&Cmd::new("pnpm", ["--version"]))
            .await?;
        let version = Self::parse_version(&version_output);

        let cmd = Cmd::new("pnpm", ["store", "path", "--loglevel", "error"]);
        let output = req.exec.output_text(&cmd).await?;

        let noisy = version
            .as_ref()
            .map_or(true, |v| *v < PNPM_QUIET_STDOUT);
        let dir = if noisy {
            debug!(version = ?version, "filtering pnpm warnings from stdout");
            Self::strip_warnings(&output)
        } else {
            output
        };
        let dir = non_empty(dir.trim(), &cmd)?;

        // Hard links and clones cannot cross into a mounted volume
        Ok(PlanResult::mounts([dir]).with_env("npm_config_package_import_method", "copy"))
    }
}

/// Yarn package cache, classic or berry
#[derive(Debug, Clone, Copy, Default)]
pub struct YarnProvider;

#[async_trait]
impl ModeProvider for YarnProvider {
    fn name(&self) -> &str {
        "yarn"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "yarn", &["yarn.lock"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let version = req
            .exec
            .output_text(&Cmd::new("yarn", ["--version"]))
            .await?;

        let cmd = if version.trim().starts_with("1.") {
            Cmd::new("yarn", ["cache", "dir"])
        } else {
            Cmd::new("yarn", ["config", "get", "cacheFolder"])
        };

        let dir = query_cache_dir(req.exec.as_ref(), cmd).await?;
        Ok(PlanResult::mounts([dir]))
    }
}
