//! Atomically swappable handle to the active model artifact.
//!
//! Readers clone the inner `Arc` and release the lock immediately, so a
//! request holds one consistent artifact for its whole lifetime even if a
//! swap happens mid-request. The swap replaces the whole `Arc` under the
//! write lock; no reader can observe parts from two versions.

use super::artifact::{ClassifierOutput, ModelArtifact};
use crate::error::{Result, TriageError};
use crate::features::FeatureVector;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Shared owner of the currently active artifact
#[derive(Debug, Default)]
pub struct ModelRegistry {
    active: RwLock<Option<Arc<ModelArtifact>>>,
}

impl ModelRegistry {
    /// Registry with no artifact loaded; every read fails until one is installed
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            active: RwLock::new(Some(Arc::new(artifact))),
        }
    }

    /// Snapshot of the active artifact
    pub fn current(&self) -> Result<Arc<ModelArtifact>> {
        let guard = self
            .active
            .read()
            .map_err(|_| TriageError::ModelUnavailable("model registry lock poisoned".into()))?;
        guard
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| TriageError::ModelUnavailable("no model artifact loaded".into()))
    }

    /// Version of the active artifact, if any
    pub fn version(&self) -> Option<String> {
        self.current().ok().map(|a| a.version_id().to_string())
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_ok()
    }

    /// Classify against a snapshot of the active artifact
    pub fn predict(&self, vector: &FeatureVector) -> Result<ClassifierOutput> {
        self.current()?.predict(vector)
    }

    /// Replace the active artifact, returning the previous one
    pub fn swap(&self, artifact: Arc<ModelArtifact>) -> Result<Option<Arc<ModelArtifact>>> {
        let mut guard = self
            .active
            .write()
            .map_err(|_| TriageError::ModelUnavailable("model registry lock poisoned".into()))?;
        let previous = guard.replace(Arc::clone(&artifact));
        info!(
            "Activated model {} (previous: {})",
            artifact.version_id(),
            previous
                .as_ref()
                .map(|p| p.version_id().to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(previous)
    }
}
