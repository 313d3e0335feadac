//! Error types for the triage pipeline
//!
//! Structured error definitions use thiserror; anyhow is accepted at the
//! binary boundary and converted into [`TriageError::Other`].
//!
//! A low-confidence diagnosis is not an error; it surfaces as
//! [`crate::gate::TriageOutcome::Unknown`].

use thiserror::Error;

/// Main error type for triage operations
#[derive(Error, Debug)]
pub enum TriageError {
    /// Text could not be parsed (the parser degrades to defaults instead)
    #[error("Parse error: {0}")]
    Parse(String),

    /// No valid model artifact is loaded, or its parts disagree on version
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Feature vector length does not match the active schema
    #[error("Feature vector has {actual} entries but schema expects {expected}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// Candidate model scored below the configured accuracy floor
    #[error("Retraining rejected: validation accuracy {accuracy:.3} below floor {floor:.3}")]
    RetrainRejected { accuracy: f64, floor: f64 },

    /// Backup or persistence failed before the artifact swap
    #[error("Retraining I/O error: {0}")]
    RetrainIo(String),

    /// Retraining was cancelled or exceeded its time budget
    #[error("Retraining aborted: {0}")]
    RetrainAborted(String),

    /// Not enough labelled samples survive filtering to train a model
    #[error("Insufficient training data: {0}")]
    InsufficientTrainingData(String),

    /// Event log operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an invalid value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl TriageError {
    /// Errors that make the current diagnosis request fail outright.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TriageError::ModelUnavailable(_) | TriageError::SchemaMismatch { .. }
        )
    }

    /// Errors raised inside the retraining routine. These are contained by
    /// the feedback loop and never reach the serving path.
    pub fn is_retrain_failure(&self) -> bool {
        matches!(
            self,
            TriageError::RetrainRejected { .. }
                | TriageError::RetrainIo(_)
                | TriageError::RetrainAborted(_)
                | TriageError::InsufficientTrainingData(_)
        )
    }
}

/// Result type alias for triage operations
pub type Result<T> = std::result::Result<T, TriageError>;

/// Convert anyhow::Error to TriageError
impl From<anyhow::Error> for TriageError {
    fn from(err: anyhow::Error) -> Self {
        TriageError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TriageError::ModelUnavailable("no artifact".to_string());
        assert_eq!(err.to_string(), "Model unavailable: no artifact");

        let err = TriageError::SchemaMismatch {
            expected: 16,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Feature vector has 3 entries but schema expects 16"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(TriageError::ModelUnavailable("x".into()).is_fatal());
        assert!(!TriageError::Parse("x".into()).is_fatal());

        let rejected = TriageError::RetrainRejected {
            accuracy: 0.2,
            floor: 0.4,
        };
        assert!(rejected.is_retrain_failure());
        assert!(!rejected.is_fatal());
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json");
        assert!(json_err.is_err());

        let err: TriageError = json_err.unwrap_err().into();
        assert!(matches!(err, TriageError::Serialization(_)));
    }
}
