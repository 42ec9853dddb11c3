//! Go toolchain and linters

use crate::error::{HoardError, HoardResult};
use crate::exec::Cmd;
use crate::mode::providers::detect_project;
use crate::mode::{DetectRequest, ModeProvider, PlanRequest, PlanResult};
use async_trait::async_trait;
use std::collections::HashMap;

const GO_CACHE: &str = "GOCACHE";
const GO_MOD_CACHE: &str = "GOMODCACHE";

/// Go build and module caches
#[derive(Debug, Clone, Copy, Default)]
pub struct GoProvider;

#[async_trait]
impl ModeProvider for GoProvider {
    fn name(&self) -> &str {
        "go"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "go", &["go.mod", "go.work"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let output = req
            .exec
            .output(&Cmd::new("go", ["env", "-json", GO_CACHE, GO_MOD_CACHE]))
            .await?;
        let mut env: HashMap<String, String> = serde_json::from_slice(&output)?;

        let build = env
            .remove(GO_CACHE)
            .ok_or_else(|| HoardError::missing_key(GO_CACHE, "go env"))?;
        let modules = env
            .remove(GO_MOD_CACHE)
            .ok_or_else(|| HoardError::missing_key(GO_MOD_CACHE, "go env"))?;

        Ok(PlanResult::mounts([build, modules]))
    }
}

const GOLANGCI_DIR_PREFIX: &str = "dir:";
const GOLANGCI_DEFAULT_DIR: &str = "~/.cache/golangci-lint";

/// golangci-lint analysis cache
#[derive(Debug, Clone, Copy, Default)]
pub struct GolangciLintProvider;

impl GolangciLintProvider {
    /// Find the `Dir:` line of `golangci-lint cache status`
    fn parse_status(output: &str) -> Option<&str> {
        output.lines().map(str::trim).find_map(|line| {
            let head = line.get(..GOLANGCI_DIR_PREFIX.len())?;
            head.eq_ignore_ascii_case(GOLANGCI_DIR_PREFIX)
                .then(|| line[GOLANGCI_DIR_PREFIX.len()..].trim())
        })
    }
}

#[async_trait]
impl ModeProvider for GolangciLintProvider {
    fn name(&self) -> &str {
        "golangci-lint"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(
            req.exec.as_ref(),
            "golangci-lint",
            &[".golangci.yml", ".golangci.yaml"],
        )
        .await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let output = req
            .exec
            .output_text(&Cmd::new("golangci-lint", ["cache", "status"]))
            .await?;
        let dir = Self::parse_status(&output)
            .filter(|dir| !dir.is_empty())
            .unwrap_or(GOLANGCI_DEFAULT_DIR);
        Ok(PlanResult::mounts([dir]))
    }
}
