//! Append-only event records.

use crate::types::{ParsedObservation, PredictionResult, SessionId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anything that can live in an append-only log
pub trait LogRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Session this record belongs to, if it is session-scoped
    fn session_id(&self) -> Option<&str>;

    fn timestamp(&self) -> DateTime<Utc>;
}

/// One diagnosis call, written whether or not the label was presented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningRecord {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub observation: ParsedObservation,
    pub prediction: PredictionResult,
}

impl LogRecord for LearningRecord {
    fn session_id(&self) -> Option<&str> {
        Some(self.session_id.as_str())
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Source of a feedback record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Clinician feedback carrying notes
    Professional,
    /// Outcome-only report
    Outcome,
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackKind::Professional => write!(f, "professional"),
            FeedbackKind::Outcome => write!(f, "outcome"),
        }
    }
}

/// Feedback as submitted by a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackInput {
    pub session_id: String,
    pub actual_label: Option<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
}

impl FeedbackInput {
    pub fn labelled(session_id: impl Into<String>, actual_label: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            actual_label: Some(actual_label.into()),
            notes: None,
            outcome: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub session_id: SessionId,
    pub actual_label: Option<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub kind: FeedbackKind,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Normalize caller input: blank strings become `None`
    pub fn from_input(input: FeedbackInput) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let notes = clean(input.notes);
        let kind = if notes.is_some() {
            FeedbackKind::Professional
        } else {
            FeedbackKind::Outcome
        };

        Self {
            id: Uuid::new_v4().to_string(),
            session_id: SessionId(input.session_id.trim().to_string()),
            actual_label: clean(input.actual_label),
            notes,
            outcome: clean(input.outcome),
            kind,
            timestamp: Utc::now(),
        }
    }
}

impl LogRecord for FeedbackRecord {
    fn session_id(&self) -> Option<&str> {
        Some(self.session_id.as_str())
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Written once per accepted retraining run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub accuracy: f64,
    pub sample_count: usize,
    pub version_id: String,
    #[serde(default)]
    pub feedback_samples: usize,
    #[serde(default)]
    pub previous_version: Option<String>,
}

impl LogRecord for TrainingHistoryEntry {
    fn session_id(&self) -> Option<&str> {
        None
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Reviewed,
}

/// Low-confidence case queued for human review.
///
/// Unlike the advisory returned to the caller, this keeps the withheld label
/// so a reviewer can see what the model would have said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownCaseRecord {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub observation: ParsedObservation,
    pub withheld_label: String,
    pub confidence: f64,
    pub threshold: f64,
    pub model_version: String,
    pub status: ReviewStatus,
}

impl LogRecord for UnknownCaseRecord {
    fn session_id(&self) -> Option<&str> {
        Some(self.session_id.as_str())
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_kind_from_notes() {
        let professional = FeedbackRecord::from_input(FeedbackInput {
            session_id: " abc ".to_string(),
            actual_label: Some("Influenza".to_string()),
            notes: Some("confirmed by swab".to_string()),
            outcome: None,
        });
        assert_eq!(professional.kind, FeedbackKind::Professional);
        assert_eq!(professional.session_id.as_str(), "abc");

        let outcome = FeedbackRecord::from_input(FeedbackInput {
            session_id: "abc".to_string(),
            actual_label: None,
            notes: Some("   ".to_string()),
            outcome: Some("recovered".to_string()),
        });
        assert_eq!(outcome.kind, FeedbackKind::Outcome);
        assert_eq!(outcome.notes, None);
    }

    #[test]
    fn test_blank_label_is_none() {
        let record = FeedbackRecord::from_input(FeedbackInput::labelled("s1", "  "));
        assert_eq!(record.actual_label, None);
    }

    #[test]
    fn test_history_entry_has_no_session() {
        let entry = TrainingHistoryEntry {
            timestamp: Utc::now(),
            accuracy: 0.8,
            sample_count: 40,
            version_id: "v1".to_string(),
            feedback_samples: 0,
            previous_version: None,
        };
        assert_eq!(entry.session_id(), None);
    }
}
