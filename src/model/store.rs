//! On-disk persistence for model artifacts.
//!
//! Layout under the artifact directory:
//!
//! ```text
//! classifier.json   {"version_id": .., "model": .., "metadata": ..}
//! labels.json       {"version_id": .., "labels": [..]}
//! schema.json       {"version_id": .., "features": [..]}
//! backups/<timestamp>-<version>/{classifier,labels,schema}.json
//! ```
//!
//! Each file is written to a temporary sibling and renamed into place. A
//! triple whose version stamps disagree (for example after an interrupted
//! write) refuses to load.

use super::artifact::{ArtifactMetadata, LabelSpace, ModelArtifact};
use super::classifier::GaussianNaiveBayes;
use crate::error::{Result, TriageError};
use crate::features::FeatureSchema;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CLASSIFIER_FILE: &str = "classifier.json";
const LABELS_FILE: &str = "labels.json";
const SCHEMA_FILE: &str = "schema.json";
const BACKUP_DIR: &str = "backups";

#[derive(Serialize, Deserialize)]
struct ClassifierFile {
    version_id: String,
    model: GaussianNaiveBayes,
    metadata: ArtifactMetadata,
}

#[derive(Serialize, Deserialize)]
struct LabelsFile {
    version_id: String,
    labels: LabelSpace,
}

#[derive(Serialize, Deserialize)]
struct SchemaFile {
    version_id: String,
    features: FeatureSchema,
}

/// Reads only the version stamp of any part file
#[derive(Deserialize)]
struct Stamp {
    version_id: String,
}

/// A timestamped copy of a previously active artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub version_id: String,
}

/// Filesystem-backed artifact store with backups and rollback
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether an active artifact has been persisted
    pub fn exists(&self) -> bool {
        self.dir.join(CLASSIFIER_FILE).exists()
    }

    /// Load the active artifact, verifying all three parts share one version
    pub fn load(&self) -> Result<ModelArtifact> {
        load_from(&self.dir)
    }

    /// Write `artifact` as the active triple
    pub fn persist(&self, artifact: &ModelArtifact) -> Result<()> {
        write_triple(&self.dir, artifact)?;
        info!(
            "Persisted model {} to {}",
            artifact.version_id(),
            self.dir.display()
        );
        Ok(())
    }

    /// Copy the active triple into a new timestamped backup directory.
    /// Returns `None` when there is nothing to back up.
    pub fn backup_current(&self) -> Result<Option<PathBuf>> {
        if !self.exists() {
            debug!("No active artifact to back up");
            return Ok(None);
        }

        let version = read_part::<Stamp>(&self.dir.join(CLASSIFIER_FILE))
            .map(|s| s.version_id)
            .unwrap_or_else(|_| "unversioned".to_string());
        let name = format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S%3f"), version);
        let target = self.dir.join(BACKUP_DIR).join(name);
        fs::create_dir_all(&target)?;

        for part in [CLASSIFIER_FILE, LABELS_FILE, SCHEMA_FILE] {
            let source = self.dir.join(part);
            if source.exists() {
                fs::copy(&source, target.join(part))?;
            } else {
                warn!("Active artifact is missing {}, backup is partial", part);
            }
        }

        info!("Backed up model {} to {}", version, target.display());
        Ok(Some(target))
    }

    /// Delete one backup directory created by [`Self::backup_current`]
    pub fn discard_backup(&self, path: &Path) -> Result<()> {
        if !path.starts_with(self.dir.join(BACKUP_DIR)) {
            return Err(TriageError::InvalidInput(format!(
                "{} is not a backup of this store",
                path.display()
            )));
        }
        fs::remove_dir_all(path)?;
        debug!("Discarded backup {}", path.display());
        Ok(())
    }

    /// Backups ordered oldest first
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        let root = self.dir.join(BACKUP_DIR);
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let version_id = read_part::<Stamp>(&path.join(CLASSIFIER_FILE))
                .map(|s| s.version_id)
                .unwrap_or_else(|_| "unversioned".to_string());
            entries.push(BackupEntry { path, version_id });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Restore the newest backup as the active artifact.
    ///
    /// The restored backup is consumed, so repeated rollbacks walk further
    /// back in history.
    pub fn rollback(&self) -> Result<ModelArtifact> {
        let latest = self
            .list_backups()?
            .pop()
            .ok_or_else(|| TriageError::NotFound("no artifact backups to roll back to".into()))?;

        let artifact = load_from(&latest.path)?;
        self.persist(&artifact)?;
        fs::remove_dir_all(&latest.path)?;

        info!(
            "Rolled back to model {} from {}",
            artifact.version_id(),
            latest.path.display()
        );
        Ok(artifact)
    }
}

fn load_from(dir: &Path) -> Result<ModelArtifact> {
    let classifier: ClassifierFile = read_part(&dir.join(CLASSIFIER_FILE))?;
    let labels: LabelsFile = read_part(&dir.join(LABELS_FILE))?;
    let schema: SchemaFile = read_part(&dir.join(SCHEMA_FILE))?;

    if classifier.version_id != labels.version_id || classifier.version_id != schema.version_id {
        return Err(TriageError::ModelUnavailable(format!(
            "artifact parts disagree on version: classifier={}, labels={}, schema={}",
            classifier.version_id, labels.version_id, schema.version_id
        )));
    }

    let artifact = ModelArtifact::new(
        classifier.version_id,
        classifier.model,
        labels.labels,
        schema.features,
        classifier.metadata,
    )?;
    debug!(
        "Loaded model {} from {}",
        artifact.version_id(),
        dir.display()
    );
    Ok(artifact)
}

fn read_part<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| {
        TriageError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        TriageError::ModelUnavailable(format!("corrupt artifact part {}: {}", path.display(), e))
    })
}

fn write_triple(dir: &Path, artifact: &ModelArtifact) -> Result<()> {
    fs::create_dir_all(dir)?;
    let version_id = artifact.version_id().to_string();

    write_part(
        &dir.join(SCHEMA_FILE),
        &SchemaFile {
            version_id: version_id.clone(),
            features: artifact.schema().clone(),
        },
    )?;
    write_part(
        &dir.join(LABELS_FILE),
        &LabelsFile {
            version_id: version_id.clone(),
            labels: artifact.labels().clone(),
        },
    )?;
    write_part(
        &dir.join(CLASSIFIER_FILE),
        &ClassifierFile {
            version_id,
            model: artifact.classifier().clone(),
            metadata: artifact.metadata().clone(),
        },
    )
}

fn write_part<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::artifact::test_support::tiny_artifact;
    use tempfile::TempDir;

    fn create_test_store() -> (ArtifactStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("model"));
        (store, temp_dir)
    }

    #[test]
    fn test_persist_and_load() {
        let (store, _dir) = create_test_store();
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(TriageError::ModelUnavailable(_))));

        let artifact = tiny_artifact("v1");
        store.persist(&artifact).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), artifact);
    }

    #[test]
    fn test_mismatched_stamps_are_unavailable() {
        let (store, _dir) = create_test_store();
        store.persist(&tiny_artifact("v1")).unwrap();

        let labels = store.dir().join(LABELS_FILE);
        let text = fs::read_to_string(&labels).unwrap().replace("v1", "v2");
        fs::write(&labels, text).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, TriageError::ModelUnavailable(ref m) if m.contains("disagree")));
    }

    #[test]
    fn test_corrupt_part_is_unavailable() {
        let (store, _dir) = create_test_store();
        store.persist(&tiny_artifact("v1")).unwrap();
        fs::write(store.dir().join(SCHEMA_FILE), "{not json").unwrap();
        assert!(matches!(store.load(), Err(TriageError::ModelUnavailable(_))));
    }

    #[test]
    fn test_backup_is_non_destructive() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.backup_current().unwrap(), None);

        store.persist(&tiny_artifact("v1")).unwrap();
        let path = store.backup_current().unwrap().unwrap();
        assert!(path.join(CLASSIFIER_FILE).exists());
        assert_eq!(store.load().unwrap().version_id(), "v1");

        let backups = store.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].version_id, "v1");
    }

    #[test]
    fn test_discard_backup() {
        let (store, dir) = create_test_store();
        store.persist(&tiny_artifact("v1")).unwrap();
        let backup = store.backup_current().unwrap().unwrap();
        assert_eq!(store.list_backups().unwrap().len(), 1);

        store.discard_backup(&backup).unwrap();
        assert!(store.list_backups().unwrap().is_empty());
        assert_eq!(store.load().unwrap().version_id(), "v1");

        let outside = dir.path().join("elsewhere");
        std::fs::create_dir_all(&outside).unwrap();
        assert!(matches!(
            store.discard_backup(&outside),
            Err(TriageError::InvalidInput(_))
        ));
        assert!(outside.exists());
    }

    #[test]
    fn test_rollback_restores_latest_backup() {
        let (store, _dir) = create_test_store();
        assert!(matches!(store.rollback(), Err(TriageError::NotFound(_))));

        store.persist(&tiny_artifact("v1")).unwrap();
        store.backup_current().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.persist(&tiny_artifact("v2")).unwrap();
        store.backup_current().unwrap();
        store.persist(&tiny_artifact("v3")).unwrap();

        assert_eq!(store.rollback().unwrap().version_id(), "v2");
        assert_eq!(store.load().unwrap().version_id(), "v2");
        assert_eq!(store.rollback().unwrap().version_id(), "v1");
        assert!(store.list_backups().unwrap().is_empty());
    }
}
