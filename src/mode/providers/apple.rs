//! Apple platform tooling

use crate::error::HoardResult;
use crate::mode::providers::{detect_project, has_binary};
use crate::mode::{DetectRequest, ModeProvider, PlanRequest, PlanResult};
use async_trait::async_trait;
use std::path::Path;

/// CocoaPods project and download caches
#[derive(Debug, Clone, Copy, Default)]
pub struct CocoapodsProvider;

#[async_trait]
impl ModeProvider for CocoapodsProvider {
    fn name(&self) -> &str {
        "cocoapods"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "pod", &["Podfile"]).await
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        Ok(PlanResult::mounts(["./Pods", "~/Library/Caches/CocoaPods"]))
    }
}

const XCODE_DERIVED_DATA: &str = "~/Library/Developer/Xcode/DerivedData";

/// Swift Package Manager build and checkout caches
#[derive(Debug, Clone, Copy, Default)]
pub struct SwiftPmProvider;

#[async_trait]
impl ModeProvider for SwiftPmProvider {
    fn name(&self) -> &str {
        "swiftpm"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        detect_project(req.exec.as_ref(), "swift", &["Package.swift"]).await
    }

    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult> {
        let mut result = PlanResult::mounts([
            "./.build",
            "~/Library/Caches/org.swift.swiftpm",
            "~/Library/org.swift.swiftpm",
        ]);

        // The xcode mode already covers derived data
        if !req.is_enabled(XcodeProvider.name()) {
            result
                .mount_paths
                .push(format!("{}/ModuleCache.noindex", XCODE_DERIVED_DATA));
        }

        Ok(result)
    }
}

const XCODE_PROJECT_SUFFIXES: &[&str] = &[".xcodeproj", ".xcworkspace"];

/// Xcode compilation cache
///
/// Experimental: the compilation cache can grow very large.
#[derive(Debug, Clone, Copy, Default)]
pub struct XcodeProvider;

#[async_trait]
impl ModeProvider for XcodeProvider {
    fn name(&self) -> &str {
        "xcode"
    }

    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool> {
        if !has_binary(req.exec.as_ref(), "xcodebuild").await? {
            return Ok(false);
        }

        let entries = req.exec.read_dir(Path::new(".")).await?;
        Ok(entries.iter().any(|entry| {
            XCODE_PROJECT_SUFFIXES
                .iter()
                .any(|suffix| entry.ends_with(suffix))
        }))
    }

    async fn plan(&self, _req: &PlanRequest) -> HoardResult<PlanResult> {
        Ok(
            PlanResult::mounts([format!("{}/CompilationCache.noindex", XCODE_DERIVED_DATA)])
                .with_env("COMPILATION_CACHE_ENABLE_CACHING_DEFAULT", "YES"),
        )
    }
}
