//! Python package managers

use crate::error::HoardResult;
use crate::exec::Cmd;
use crate::mode::providers::{detect_project, query_cache_dir};
use crate::mode::{DetectRequest, ModeProvider, PlanRequest, PlanResult};
use async_trait::async_trait;

/// Poetry package cache
#[derive(Debug, Clone, Copy, Default)]
pub struct PoetryProvider;

#[async_trait]
impl ModeProvider for PoetryProvider {
    fn name(&self) -> &str {
        "poetry"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "poetry", &["poetry.lock"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let cmd = Cmd::new("poetry", ["config", "cache-dir"]);
        let dir = query_cache_dir(req.exec.as_ref(), cmd).await?;
        Ok(PlanResult::mounts([dir]))
    }
}

/// pip wheel and HTTP cache
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonProvider;

#[async_trait]
impl ModeProvider for PythonProvider {
    fn name(&self) -> &str {
        "python"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "pip", &["requirements.txt"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let dir = query_cache_dir(req.exec.as_ref(), Cmd::new("pip", ["cache", "dir"])).await?;
        Ok(PlanResult::mounts([dir]))
    }
}

/// uv package cache
#[derive(Debug, Clone, Copy, Default)]
pub struct UvProvider;

#[async_trait]
impl ModeProvider for UvProvider {
    fn name(&self) -> &str {
        "uv"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "uv", &["uv.lock"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let dir = query_cache_dir(req.exec.as_ref(), Cmd::new("uv", ["cache", "dir"])).await?;

        // Clone and hardlink both fall back to copying on a mounted volume
        Ok(PlanResult::mounts([dir]).with_env("UV_LINK_MODE", "symlink"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HoardError;
    use crate::exec::{Executor, FakeExecutor};
    use std::sync::Arc;

    fn plan_req(exec: FakeExecutor) -> PlanRequest {
        PlanRequest::new(Arc::new(exec) as Arc<dyn Executor>)
    }

    #[tokio::test]
    async fn poetry_plan() {
        let exec = FakeExecutor::new()
            .with_output("poetry config cache-dir", "/home/ci/.cache/pypoetry\n");
        let result = PoetryProvider.plan(&plan_req(exec)).await.unwrap();
        assert_eq!(result.mount_paths, vec!["/home/ci/.cache/pypoetry"]);
        assert!(result.add_envs.is_empty());
    }

    #[tokio::test]
    async fn python_detect_requirements() {
        let exec = FakeExecutor::new()
            .with_binary("pip")
            .with_file("requirements.txt");
        let req = DetectRequest::new(Arc::new(exec));
        assert!(PythonProvider.detect(&req).await.unwrap());
    }

    #[tokio::test]
    async fn python_plan_failure() {
        let exec = FakeExecutor::new().with_failure("pip cache dir", "ERROR: pip cache commands can not function since cache is disabled.");
        let err = PythonProvider.plan(&plan_req(exec)).await.unwrap_err();
        assert!(matches!(err, HoardError::CommandExecution { .. }));
    }

    #[tokio::test]
    async fn uv_plan_symlink_mode() {
        let exec = FakeExecutor::new().with_output("uv cache dir", "/home/ci/.cache/uv\n");
        let result = UvProvider.plan(&plan_req(exec)).await.unwrap();
        assert_eq!(result.mount_paths, vec!["/home/ci/.cache/uv"]);
        assert_eq!(result.add_envs["UV_LINK_MODE"], "symlink");
    }

    #[tokio::test]
    async fn uv_plan_empty() {
        let exec = FakeExecutor::new().with_output("uv cache dir", "");
        let err = UvProvider.plan(&plan_req(exec)).await.unwrap_err();
        assert_eq!(err.to_string(), "empty cache dir from uv cache dir");
    }
}
