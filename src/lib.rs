//! MediChain Triage - Free-Text Symptom Triage Engine
//!
//! Turns a natural-language symptom description into a triage outcome and
//! improves its classifier from clinician feedback:
//! - Keyword/pattern parsing into a normalized observation
//! - Schema-aligned feature vectors
//! - Versioned naive-Bayes model artifacts with atomic swap and rollback
//! - Explainable, hard-capped confidence boosting
//! - A two-state gate that withholds low-confidence labels
//! - Append-only event logs feeding a single-flight retraining loop
//!
//! # Example
//!
//! ```ignore
//! use triage_core::{DiagnosisEngine, ManualInput, TriageConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TriageConfig::load(None)?;
//!     let engine = DiagnosisEngine::open(&config).await?;
//!
//!     let report = engine
//!         .diagnose("severe headache and fever for 3 days", ManualInput::none())
//!         .await?;
//!     println!("{:?}", report.outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod booster;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod gate;
pub mod learning;
pub mod model;
pub mod parser;
pub mod recommendations;
pub mod types;

// Re-export commonly used types
pub use booster::{BoostOutcome, ConfidenceBooster, CONFIDENCE_CEILING};
pub use config::TriageConfig;
pub use engine::{Assessment, DiagnosisEngine, DiagnosisReport, EngineComponents};
pub use error::{Result, TriageError};
pub use features::{FeatureSchema, FeatureVector};
pub use gate::{TriageOutcome, UnknownCaseAdvisory, UnknownCaseGate};
pub use learning::{FeedbackInput, FeedbackLoop, LearningStatistics, RetrainOutcome};
pub use model::{ArtifactStore, ModelArtifact, ModelRegistry};
pub use parser::SymptomParser;
pub use recommendations::{RecommendationBundle, RecommendationLookup, StaticRecommendations};
pub use types::{
    ConfidenceLevel, Intensity, ManualInput, ParsedObservation, PredictionResult, RankedLabel,
    SessionId, SymptomKey,
};
