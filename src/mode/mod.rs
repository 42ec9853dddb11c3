//! Cache mode providers
//!
//! A cache mode knows how to detect one package ecosystem in the current
//! workspace and where that ecosystem's tooling keeps its caches.
//!
//! [`Modes`] is an ordered collection of providers. Detection and planning run
//! every provider concurrently; the first failure aborts the remaining tasks
//! and is returned on its own, wrapped with the failing provider's name.

pub mod providers;

pub use providers::*;

use crate::error::{HoardError, HoardResult};
use crate::exec::Executor;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

/// Ecosystem detection and cache resolution
///
/// Providers are stateless; everything they need arrives in the request.
#[async_trait]
pub trait ModeProvider: Send + Sync {
    /// Unique lowercase mode name
    fn name(&self) -> &str;

    /// Whether the ecosystem is present in the current workspace
    ///
    /// A tool that is not installed yields `Ok(false)`, not an error.
    async fn detect(&self, req: &DetectRequest) -> HoardResult<bool>;

    /// Resolve concrete cache locations
    async fn plan(&self, req: &PlanRequest) -> HoardResult<PlanResult>;
}

/// Input to [`ModeProvider::detect`]
#[derive(Clone)]
pub struct DetectRequest {
    pub exec: Arc<dyn Executor>,
}

impl DetectRequest {
    pub fn new(exec: Arc<dyn Executor>) -> Self {
        Self { exec }
    }
}

/// Input to [`ModeProvider::plan`]
#[derive(Clone)]
pub struct PlanRequest {
    pub exec: Arc<dyn Executor>,
    /// Names of every mode enabled in this run
    pub enabled_modes: Vec<String>,
}

impl PlanRequest {
    pub fn new(exec: Arc<dyn Executor>) -> Self {
        Self {
            exec,
            enabled_modes: Vec::new(),
        }
    }

    /// Whether a sibling mode is enabled in this run
    pub fn is_enabled(&self, mode: &str) -> bool {
        self.enabled_modes.iter().any(|m| m == mode)
    }
}

/// Cache locations resolved for one mode
///
/// Paths may start with `~`; home expansion happens in the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanResult {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub add_envs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mount_paths: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_paths: Vec<String>,
}

impl PlanResult {
    /// A plan that only mounts the given paths
    pub fn mounts<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mount_paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add an environment variable to export
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.add_envs.insert(key.to_string(), value.to_string());
        self
    }
}

/// Every built-in provider
///
/// Returns a fresh collection on each call; the registry is never shared
/// mutable state.
pub fn default_modes() -> Modes {
    Modes::new(vec![
        Arc::new(AptProvider),
        Arc::new(BrewProvider),
        Arc::new(BunProvider),
        Arc::new(CocoapodsProvider),
        Arc::new(ComposerProvider),
        Arc::new(DenoProvider),
        Arc::new(GoProvider),
        Arc::new(GolangciLintProvider),
        Arc::new(GradleProvider),
        Arc::new(MavenProvider),
        Arc::new(MiseProvider),
        Arc::new(NixProvider),
        Arc::new(PlaywrightProvider),
        Arc::new(PnpmProvider),
        Arc::new(PoetryProvider),
        Arc::new(PythonProvider),
        Arc::new(RubyProvider),
        Arc::new(RustProvider),
        Arc::new(SwiftPmProvider),
        Arc::new(UvProvider),
        Arc::new(XcodeProvider),
        Arc::new(YarnProvider),
    ])
}

/// Ordered collection of mode providers
#[derive(Clone, Default)]
pub struct Modes {
    providers: Vec<Arc<dyn ModeProvider>>,
}

impl Modes {
    pub fn new(providers: Vec<Arc<dyn ModeProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ModeProvider>> {
        self.providers.iter()
    }

    /// Sorted names of all providers
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.iter().map(|m| m.name().to_string()).collect();
        names.sort();
        names
    }

    /// Project down to exactly the named providers, in the order given
    ///
    /// Fails on the first name that is not registered.
    pub fn filter<S: AsRef<str>>(&self, include: &[S]) -> HoardResult<Modes> {
        if self.providers.is_empty() {
            return Ok(Modes::default());
        }

        let available: HashMap<&str, &Arc<dyn ModeProvider>> =
            self.providers.iter().map(|m| (m.name(), m)).collect();

        let providers = include
            .iter()
            .map(|name| {
                let name = name.as_ref();
                available
                    .get(name)
                    .map(|m| Arc::clone(*m))
                    .ok_or_else(|| HoardError::UnknownMode(name.to_string()))
            })
            .collect::<HoardResult<Vec<_>>>()?;

        Ok(Modes { providers })
    }

    /// Detect all providers concurrently, returning those that are present
    ///
    /// Result order is unspecified.
    pub async fn detect(&self, req: DetectRequest) -> HoardResult<Modes> {
        let results = self
            .fan_out("detecting", |mode| {
                let req = req.clone();
                async move { mode.detect(&req).await }
            })
            .await?;

        let providers = results
            .into_iter()
            .filter_map(|(mode, detected)| detected.then_some(mode))
            .collect();

        Ok(Modes { providers })
    }

    /// Plan all providers concurrently, keyed by mode name
    ///
    /// Every provider sees the names of all modes in this collection.
    pub async fn plan(&self, mut req: PlanRequest) -> HoardResult<BTreeMap<String, PlanResult>> {
        req.enabled_modes = self.names();

        let results = self
            .fan_out("planning", |mode| {
                let req = req.clone();
                async move { mode.plan(&req).await }
            })
            .await?;

        Ok(results
            .into_iter()
            .map(|(mode, plan)| (mode.name().to_string(), plan))
            .collect())
    }

    /// Run one task per provider; the first error aborts the rest
    async fn fan_out<T, F, Fut>(
        &self,
        operation: &'static str,
        task: F,
    ) -> HoardResult<Vec<(Arc<dyn ModeProvider>, T)>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn ModeProvider>) -> Fut,
        Fut: Future<Output = HoardResult<T>> + Send + 'static,
    {
        let mut set = JoinSet::new();
        for mode in &self.providers {
            let name = mode.name().to_string();
            let fut = task(Arc::clone(mode));
            let mode = Arc::clone(mode);
            set.spawn(async move {
                match fut.await {
                    Ok(value) => Ok((mode, value)),
                    Err(source) => Err(HoardError::provider(operation, name, source)),
                }
            });
        }

        let mut results = Vec::with_capacity(self.providers.len());
        while let Some(joined) = set.join_next().await {
            let outcome = joined
                .map_err(|e| HoardError::Internal(format!("{} task failed: {}", operation, e)))?;
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    debug!(%err, "aborting remaining {} tasks", operation);
                    set.abort_all();
                    return Err(err);
                }
            }
        }

        Ok(results)
    }
}

impl std::fmt::Debug for Modes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|m| m.name()))
            .finish()
    }
}
