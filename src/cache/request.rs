//! Mount requests and mode resolution

use crate::error::{HoardError, HoardResult};
use crate::exec::Executor;
use crate::mode::{DetectRequest, Modes};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// What the caller asked to mount
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountRequest {
    /// Run detection over every registered mode
    pub detect_all_modes: bool,
    /// Run detection over these modes only
    pub detect_modes: Vec<String>,
    /// Enable these modes without detection
    pub manual_modes: Vec<String>,
    /// Mount these paths without any mode
    pub manual_paths: Vec<String>,
}

impl MountRequest {
    /// Whether nothing at all was requested
    pub fn is_empty(&self) -> bool {
        !self.detect_all_modes
            && self.detect_modes.is_empty()
            && self.manual_modes.is_empty()
            && self.manual_paths.is_empty()
    }

    /// Resolve the modes enabled by this request
    ///
    /// Manual modes come first, followed by detected modes. Names enabled
    /// both ways are kept once, and every name is validated against
    /// `available`.
    pub async fn enabled_modes(
        &self,
        available: &Modes,
        exec: Arc<dyn Executor>,
    ) -> HoardResult<Modes> {
        if self.is_empty() {
            return Err(HoardError::NoModesOrPaths);
        }

        let mut enabled = self.manual_modes.clone();

        let detect = if self.detect_all_modes {
            available.names()
        } else {
            self.detect_modes.clone()
        };

        if !detect.is_empty() {
            let candidates = available.filter(&detect)?;
            let detected = candidates.detect(DetectRequest::new(exec)).await?;
            debug!(detected = ?detected.names(), "detected cache modes");
            enabled.extend(detected.names());
        }

        let mut seen = HashSet::new();
        enabled.retain(|name| seen.insert(name.clone()));

        available.filter(&enabled)
    }
}
