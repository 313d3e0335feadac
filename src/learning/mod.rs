//! Feedback and retraining.
//!
//! Predictions and clinician feedback are appended to event logs. Once
//! enough feedback accumulates, a candidate model is trained on the base
//! corpus plus feedback-labelled observations and activated only if it
//! clears the accuracy floor.

pub mod corpus;
pub mod feedback;
pub mod log;
pub mod records;
pub mod retrain;

pub use corpus::{Corpus, TrainingSample};
pub use feedback::{FeedbackLoop, FeedbackReceipt, LearningStatistics, RetrainOutcome};
pub use log::{AppendLog, EventStore, JsonlLog, MemoryLog};
pub use records::{
    FeedbackInput, FeedbackKind, FeedbackRecord, LearningRecord, LogRecord, ReviewStatus,
    TrainingHistoryEntry, UnknownCaseRecord,
};
pub use retrain::{Candidate, CandidateTrainer, RetrainReport, Retrainer};
