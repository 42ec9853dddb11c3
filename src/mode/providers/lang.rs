//! PHP, Ruby and Rust

use crate::error::HoardResult;
use crate::exec::Cmd;
use crate::mode::providers::{detect_project, query_cache_dir};
use crate::mode::{DetectRequest, ModeProvider, PlanRequest, PlanResult};
use async_trait::async_trait;

/// Composer download cache
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposerProvider;

#[async_trait]
impl ModeProvider for ComposerProvider {
    fn name(&self) -> &str {
        "composer"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "composer", &["composer.json"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let cmd = Cmd::new("composer", ["config", "--global", "cache-files-dir"]);
        let dir = query_cache_dir(req.exec.as_ref(), cmd).await?;
        Ok(PlanResult::mounts([dir]))
    }
}

/// Bundler vendored gems
#[derive(Debug, Clone, Copy, Default)]
pub struct RubyProvider;

#[async_trait]
impl ModeProvider for RubyProvider {
    fn name(&self) -> &str {
        "ruby"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "bundle", &["Gemfile"]).await
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        // vendor/bundle holds `bundle install`, vendor/cache holds `bundle cache`
        Ok(PlanResult::mounts(["./vendor/bundle", "./vendor/cache"]))
    }
}

/// Cargo registry, git checkouts and the target directory
#[derive(Debug, Clone, Copy, Default)]
pub struct RustProvider;

#[async_trait]
impl ModeProvider for RustProvider {
    fn name(&self) -> &str {
        "rust"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "cargo", &["Cargo.toml"]).await
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        // ~/.cargo/bin holds the toolchain itself and must stay untouched
        Ok(PlanResult::mounts([
            "~/.cargo/registry",
            "~/.cargo/git",
            "./target",
            "~/.cargo/.global-cache",
        ]))
    }
}
