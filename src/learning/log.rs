//! Append-only log backends.
//!
//! [`AppendLog`] is the narrow interface the learning loop needs. Two
//! implementations ship here: newline-delimited JSON files and an in-memory
//! vector for tests and embedding. Writers are serialized per log so
//! concurrent appends never interleave.

use super::records::{
    FeedbackRecord, LearningRecord, LogRecord, TrainingHistoryEntry, UnknownCaseRecord,
};
use crate::error::{Result, TriageError};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Append-only storage for one record type
#[async_trait]
pub trait AppendLog<R: LogRecord>: Send + Sync {
    async fn append(&self, record: &R) -> Result<()>;

    /// All records in append order
    async fn read_all(&self) -> Result<Vec<R>>;

    /// Records for one session in append order
    async fn find_by_session_id(&self, session_id: &str) -> Result<Vec<R>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.session_id() == Some(session_id))
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read_all().await?.len())
    }
}

/// One JSON document per line in a single file
pub struct JsonlLog<R> {
    path: PathBuf,
    writer: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: LogRecord> JsonlLog<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<R: LogRecord> AppendLog<R> for JsonlLog<R> {
    async fn append(&self, record: &R) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.writer.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                TriageError::Storage(format!("Failed to create log directory: {}", e))
            })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                TriageError::Storage(format!("Failed to open {}: {}", self.path.display(), e))
            })?;
        file.write_all(&line)
            .await
            .map_err(|e| TriageError::Storage(format!("Failed to append record: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| TriageError::Storage(format!("Failed to flush log: {}", e)))?;

        debug!("Appended record to {}", self.path.display());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<R>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TriageError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping malformed line {} in {}: {}",
                    number + 1,
                    self.path.display(),
                    e
                ),
            }
        }
        Ok(records)
    }
}

/// Volatile log held in memory
pub struct MemoryLog<R> {
    records: RwLock<Vec<R>>,
}

impl<R: LogRecord> Default for MemoryLog<R> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<R: LogRecord> MemoryLog<R> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<R: LogRecord> AppendLog<R> for MemoryLog<R> {
    async fn append(&self, record: &R) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<R>> {
        Ok(self.records.read().await.clone())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

/// The four logs the learning loop writes
#[derive(Clone)]
pub struct EventStore {
    pub learning: Arc<dyn AppendLog<LearningRecord>>,
    pub feedback: Arc<dyn AppendLog<FeedbackRecord>>,
    pub history: Arc<dyn AppendLog<TrainingHistoryEntry>>,
    pub review: Arc<dyn AppendLog<UnknownCaseRecord>>,
}

impl EventStore {
    /// JSONL files under `dir`
    pub fn open_dir(dir: &Path) -> Self {
        Self {
            learning: Arc::new(JsonlLog::new(dir.join("learning_log.jsonl"))),
            feedback: Arc::new(JsonlLog::new(dir.join("feedback_log.jsonl"))),
            history: Arc::new(JsonlLog::new(dir.join("training_history.jsonl"))),
            review: Arc::new(JsonlLog::new(dir.join("unknown_cases.jsonl"))),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            learning: Arc::new(MemoryLog::new()),
            feedback: Arc::new(MemoryLog::new()),
            history: Arc::new(MemoryLog::new()),
            review: Arc::new(MemoryLog::new()),
        }
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore").finish_non_exhaustive()
    }
}
