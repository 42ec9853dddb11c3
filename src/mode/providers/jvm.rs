//! JVM build tools

use crate::error::HoardResult;
use crate::mode::providers::detect_project;
use crate::mode::{DetectRequest, ModeProvider, PlanRequest, PlanResult};
use async_trait::async_trait;

/// Gradle dependency caches and wrapper distributions
#[derive(Debug, Clone, Copy, Default)]
pub struct GradleProvider;

#[async_trait]
impl ModeProvider for GradleProvider {
    fn name(&self) -> &str {
        "gradle"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "gradle", &["gradlew", "build.gradle"]).await
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        Ok(PlanResult::mounts(["~/.gradle/caches", "~/.gradle/wrapper"]))
    }
}

/// Maven local repository
#[derive(Debug, Clone, Copy, Default)]
pub struct MavenProvider;

#[async_trait]
impl ModeProvider for MavenProvider {
    fn name(&self) -> &str {
        "maven"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "mvn", &["pom.xml"]).await
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        Ok(PlanResult::mounts(["~/.m2/repository"]))
    }
}
