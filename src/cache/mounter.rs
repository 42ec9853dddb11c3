//! The mount orchestrator

use crate::cache::{
    CacheMetadata, MountRequest, MountResponse, MountResult, METADATA_DIR, METADATA_FILE,
};
use crate::error::{HoardError, HoardResult};
use crate::exec::Executor;
use crate::mode::{default_modes, Modes, PlanRequest};
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Expand a leading `~` or `~/` against `home`
///
/// `~user` forms are left untouched.
pub fn resolve_home(path: &str, home: Option<&Path>) -> HoardResult<PathBuf> {
    let rest = match path {
        "~" => "",
        _ => match path.strip_prefix("~/") {
            Some(rest) => rest,
            None => return Ok(PathBuf::from(path)),
        },
    };

    let home = home.ok_or_else(|| HoardError::PathInvalid {
        path: PathBuf::from(path),
        reason: "home directory is unknown".to_string(),
    })?;
    Ok(if rest.is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    })
}

/// Location under `root` backing `mount_path`
///
/// Root and `.` components are dropped; `..` is rejected so the result can
/// never escape the cache root.
pub fn cache_path(root: &Path, mount_path: &Path) -> HoardResult<PathBuf> {
    let mut path = root.to_path_buf();
    for component in mount_path.components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::ParentDir => {
                return Err(HoardError::PathInvalid {
                    path: mount_path.to_path_buf(),
                    reason: "parent directory references are not allowed".to_string(),
                })
            }
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }
    Ok(path)
}

/// Mounts planned and manual paths from a cache root
pub struct Mounter {
    destructive: bool,
    cache_root: PathBuf,
    home: Option<PathBuf>,
    exec: Arc<dyn Executor>,
    modes: Modes,
}

impl Mounter {
    /// Create a dry-run mounter over the default modes
    ///
    /// The cache root must be an existing directory; it is made absolute.
    pub async fn new(cache_root: impl AsRef<Path>, exec: Arc<dyn Executor>) -> HoardResult<Self> {
        let cache_root = cache_root.as_ref();
        let invalid = |reason: &str| HoardError::CacheRootInvalid {
            path: cache_root.to_path_buf(),
            reason: reason.to_string(),
        };

        if cache_root.as_os_str().is_empty() {
            return Err(invalid("path is empty"));
        }

        let cache_root = std::path::absolute(cache_root)
            .map_err(|e| HoardError::io(format!("resolving {}", cache_root.display()), e))?;

        match exec.stat(&cache_root).await? {
            None => return Err(invalid("does not exist")),
            Some(info) if !info.is_dir() => return Err(invalid("not a directory")),
            Some(_) => {}
        }

        Ok(Self {
            destructive: false,
            cache_root,
            home: dirs::home_dir(),
            exec,
            modes: default_modes(),
        })
    }

    /// Actually mount, remove and write instead of only reporting
    pub fn destructive(mut self, destructive: bool) -> Self {
        self.destructive = destructive;
        self
    }

    /// Use a different set of modes
    pub fn with_modes(mut self, modes: Modes) -> Self {
        self.modes = modes;
        self
    }

    /// Override the home directory used for `~` expansion
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn is_destructive(&self) -> bool {
        self.destructive
    }

    /// Resolve, plan and mount everything the request asks for
    pub async fn mount(&self, req: &MountRequest) -> HoardResult<MountResponse> {
        let mut response = MountResponse::default();
        response.output.destructive_mode = self.destructive;

        let modes = req
            .enabled_modes(&self.modes, Arc::clone(&self.exec))
            .await?;
        response.input.modes = modes.names();
        response.input.paths = req.manual_paths.clone();

        let plans = modes.plan(PlanRequest::new(Arc::clone(&self.exec))).await?;

        for (mode, plan) in &plans {
            for path in &plan.mount_paths {
                let mount = self
                    .mount_path(mode, path)
                    .await
                    .map_err(|e| HoardError::provider("mounting", mode.as_str(), e))?;
                response.output.mounts.push(mount);
            }
        }

        for path in &req.manual_paths {
            let mount = self
                .mount_path("", path)
                .await
                .map_err(|e| HoardError::MountPath {
                    path: path.clone(),
                    source: Box::new(e),
                })?;
            response.output.mounts.push(mount);
        }

        // Later modes win on key collisions
        for plan in plans.values() {
            response
                .output
                .add_envs
                .extend(plan.add_envs.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        for (mode, plan) in &plans {
            for path in &plan.remove_paths {
                self.remove_path(path)
                    .await
                    .map_err(|e| HoardError::provider("removing", mode.as_str(), e))?;
                response.output.removed_paths.push(path.clone());
            }
        }

        self.write_metadata(&response.output.mounts).await?;

        response.output.disk_usage = match self.exec.disk_usage(&self.cache_root).await {
            Ok(usage) => Some(usage),
            Err(e) => {
                debug!(error = %e, "disk usage unavailable");
                None
            }
        };

        info!(
            modes = response.input.modes.len(),
            mounts = response.output.mounts.len(),
            destructive = self.destructive,
            "cache mount complete"
        );

        Ok(response)
    }

    async fn mount_path(&self, mode: &str, path: &str) -> HoardResult<MountResult> {
        let mount_path = resolve_home(path, self.home.as_deref())?;
        let cache_path = cache_path(&self.cache_root, &mount_path)?;

        let cache_hit = self.exec.stat(&cache_path).await?.is_some();
        let mount = MountResult {
            mode: mode.to_string(),
            cache_path,
            mount_path,
            cache_hit,
        };

        if !self.destructive {
            debug!(
                from = %mount.cache_path.display(),
                to = %mount.mount_path.display(),
                "dry-run: would mount cache path"
            );
            return Ok(mount);
        }

        debug!(
            from = %mount.cache_path.display(),
            to = %mount.mount_path.display(),
            cache_hit,
            "mounting cache path"
        );
        self.exec.mount(&mount.cache_path, &mount.mount_path).await?;
        Ok(mount)
    }

    async fn remove_path(&self, path: &str) -> HoardResult<()> {
        if !self.destructive {
            debug!(path, "dry-run: would remove path");
            return Ok(());
        }

        debug!(path, "removing path");
        self.exec.remove_all(Path::new(path)).await
    }

    async fn write_metadata(&self, mounts: &[MountResult]) -> HoardResult<()> {
        let dir = self.cache_root.join(METADATA_DIR);
        let path = dir.join(METADATA_FILE);
        let metadata = CacheMetadata::from_mounts(mounts, Utc::now());

        if !self.destructive {
            debug!(
                path = %path.display(),
                entries = metadata.user_request.len(),
                "dry-run: would write cache metadata"
            );
            return Ok(());
        }

        let data = serde_json::to_vec_pretty(&metadata)?;
        self.exec.create_dir_all(&dir, 0o755).await?;
        debug!(path = %path.display(), "writing cache metadata");
        self.exec.write_file(&path, &data, 0o644).await
    }
}
