//! The diagnosis engine.
//!
//! [`DiagnosisEngine`] owns every pipeline stage plus the feedback loop and
//! is constructed explicitly, either from parts ([`DiagnosisEngine::new`]) or
//! from configuration ([`DiagnosisEngine::open`]). The synchronous path
//! (`parse -> build -> predict -> boost -> gate`) takes one artifact snapshot
//! per call, so a concurrent swap never mixes versions within a request.

use crate::booster::ConfidenceBooster;
use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use crate::features::{self, FeatureSchema};
use crate::gate::{TriageOutcome, UnknownCaseGate};
use crate::learning::{
    Corpus, EventStore, FeedbackInput, FeedbackLoop, FeedbackReceipt, LearningStatistics,
    RetrainOutcome, RetrainReport, Retrainer,
};
use crate::model::{ArtifactStore, ModelRegistry};
use crate::parser::SymptomParser;
use crate::recommendations::{RecommendationBundle, RecommendationLookup, StaticRecommendations};
use crate::types::{ManualInput, ParsedObservation, PredictionResult, SessionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of the synchronous pipeline, before anything is recorded
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub observation: ParsedObservation,
    /// Boosted prediction, including the label even when the gate withholds it
    pub prediction: PredictionResult,
    pub outcome: TriageOutcome,
}

/// What a caller receives from [`DiagnosisEngine::diagnose`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub session_id: SessionId,
    /// False when the prediction could not be logged; feedback on this
    /// session will be rejected as unknown.
    pub recorded: bool,
    pub observation: ParsedObservation,
    pub outcome: TriageOutcome,
    /// Present only for known cases with a table entry
    pub recommendations: Option<RecommendationBundle>,
    pub model_version: String,
}

impl DiagnosisReport {
    pub fn is_unknown(&self) -> bool {
        self.outcome.is_unknown()
    }
}

/// Collaborators for [`DiagnosisEngine::new`]
pub struct EngineComponents {
    pub registry: Arc<ModelRegistry>,
    pub events: EventStore,
    pub store: Option<ArtifactStore>,
    pub retrainer: Retrainer,
    pub recommendations: Arc<dyn RecommendationLookup>,
}

pub struct DiagnosisEngine {
    parser: SymptomParser,
    booster: ConfidenceBooster,
    gate: UnknownCaseGate,
    alternatives: usize,
    registry: Arc<ModelRegistry>,
    store: Option<ArtifactStore>,
    learning: FeedbackLoop,
    recommendations: Arc<dyn RecommendationLookup>,
}

impl DiagnosisEngine {
    pub fn new(config: &TriageConfig, components: EngineComponents) -> Self {
        let EngineComponents {
            registry,
            events,
            store,
            retrainer,
            recommendations,
        } = components;

        let learning = FeedbackLoop::new(events, Arc::clone(&registry), store.clone(), retrainer);

        Self {
            parser: SymptomParser::new(&config.parser),
            booster: ConfidenceBooster::new(config.parser.default_duration_days),
            gate: UnknownCaseGate::new(config.gate.unknown_threshold),
            alternatives: config.booster.alternatives,
            registry,
            store,
            learning,
            recommendations,
        }
    }

    /// Open on-disk state, training the first artifact from the base corpus
    /// when none has been persisted yet
    pub async fn open(config: &TriageConfig) -> Result<Self> {
        let store = ArtifactStore::new(&config.storage.artifact_dir);
        let base = match Corpus::load(&config.storage.base_corpus) {
            Ok(corpus) => corpus,
            Err(TriageError::NotFound(msg)) if store.exists() => {
                warn!("Base corpus unavailable, retraining limited to feedback: {}", msg);
                Corpus::default()
            }
            Err(e) => return Err(e),
        };

        let artifact = if store.exists() {
            store.load()?
        } else {
            info!("No persisted model, training initial artifact from base corpus");
            let retrainer =
                Retrainer::new(base.clone(), FeatureSchema::standard(), config.learning.clone());
            let candidate = retrainer.bootstrap()?;
            store.persist(&candidate.artifact)?;
            candidate.artifact
        };
        info!(
            "Serving model {} ({} labels, {} features)",
            artifact.version_id(),
            artifact.labels().len(),
            artifact.schema().len()
        );

        let retrainer = Retrainer::new(base, artifact.schema().clone(), config.learning.clone());
        let recommendations = StaticRecommendations::load(&config.storage.recommendations)?;

        let engine = Self::new(
            config,
            EngineComponents {
                registry: Arc::new(ModelRegistry::with_artifact(artifact)),
                events: EventStore::open_dir(&config.storage.data_dir),
                store: Some(store),
                retrainer,
                recommendations: Arc::new(recommendations),
            },
        );
        engine.learning.restore_state().await?;
        Ok(engine)
    }

    /// Fit a fresh artifact from the base corpus and persist it as active,
    /// backing up whatever was active before
    pub fn train_from_corpus(config: &TriageConfig) -> Result<RetrainReport> {
        let base = Corpus::load(&config.storage.base_corpus)?;
        let retrainer = Retrainer::new(base, FeatureSchema::standard(), config.learning.clone());
        let candidate = retrainer.bootstrap()?;

        let store = ArtifactStore::new(&config.storage.artifact_dir);
        store.backup_current()?;
        store.persist(&candidate.artifact)?;
        Ok(candidate.report)
    }

    pub fn parser(&self) -> &SymptomParser {
        &self.parser
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn learning(&self) -> &FeedbackLoop {
        &self.learning
    }

    pub fn gate(&self) -> &UnknownCaseGate {
        &self.gate
    }

    pub fn model_version(&self) -> Option<String> {
        self.registry.version()
    }

    /// Turn free-text hints into manual input. Unreadable hints are dropped.
    pub fn manual_input(&self, duration: Option<&str>, intensity: Option<&str>) -> ManualInput {
        let duration_days = duration.and_then(|hint| {
            let parsed = self.parser.parse_duration_hint(hint);
            if parsed.is_none() {
                warn!("Ignoring unreadable duration hint '{}'", hint);
            }
            parsed
        });
        let intensity = intensity.and_then(|hint| {
            let parsed = self.parser.parse_intensity_hint(hint);
            if parsed.is_none() {
                warn!("Ignoring unreadable intensity hint '{}'", hint);
            }
            parsed
        });
        ManualInput {
            duration_days,
            intensity,
        }
    }

    /// Run the pipeline without recording anything
    pub fn assess(&self, text: &str, manual: ManualInput) -> Result<Assessment> {
        let observation = self.parser.parse(text, manual);
        let artifact = self.registry.current()?;

        let vector = features::build(&observation, artifact.schema());
        let output = artifact.predict(&vector)?;
        let boost = self.booster.boost(output.probability, &observation);

        let prediction = PredictionResult {
            label: output.label.clone(),
            raw_probability: output.probability,
            boosted_confidence: boost.boosted_confidence,
            alternatives: output.alternatives(self.alternatives),
            boost_factors: boost.reasons(),
            model_version: artifact.version_id().to_string(),
        };
        debug!(
            "Model {} predicts {} ({:.3} raw, {:.3} boosted)",
            prediction.model_version,
            prediction.label,
            prediction.raw_probability,
            prediction.boosted_confidence
        );

        let outcome = self.gate.decide(prediction.clone(), &observation);
        Ok(Assessment {
            observation,
            prediction,
            outcome,
        })
    }

    /// Run the pipeline and record the prediction (and review case, if unknown)
    pub async fn diagnose(&self, text: &str, manual: ManualInput) -> Result<DiagnosisReport> {
        let Assessment {
            observation,
            prediction,
            outcome,
        } = self.assess(text, manual)?;

        let (session_id, recorded) =
            match self.learning.record_prediction(&observation, &prediction).await {
                Ok(session_id) => (session_id, true),
                Err(e) => {
                    let session_id = SessionId::new();
                    error!(
                        "Failed to record prediction, session {} cannot take feedback: {}",
                        session_id, e
                    );
                    (session_id, false)
                }
            };

        if outcome.is_unknown() {
            if let Err(e) = self
                .learning
                .record_unknown_case(&session_id, &observation, &prediction, self.gate.threshold())
                .await
            {
                warn!("Failed to queue unknown case {}: {}", session_id, e);
            }
        }

        let recommendations = outcome
            .prediction()
            .and_then(|known| self.recommendations.get(&known.label));

        Ok(DiagnosisReport {
            session_id,
            recorded,
            observation,
            outcome,
            recommendations,
            model_version: prediction.model_version,
        })
    }

    pub async fn record_feedback(&self, input: FeedbackInput) -> Result<FeedbackReceipt> {
        self.learning.record_feedback(input).await
    }

    pub async fn retrain_now(&self) -> RetrainOutcome {
        self.learning.retrain_now().await
    }

    pub async fn await_retrain(&self) -> Option<RetrainOutcome> {
        self.learning.await_retrain().await
    }

    pub async fn statistics(&self) -> Result<LearningStatistics> {
        self.learning.statistics().await
    }

    /// Restore the newest artifact backup and make it active
    pub fn rollback(&self) -> Result<String> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| TriageError::InvalidInput("engine has no artifact store".into()))?;
        if self.learning.is_retraining() {
            return Err(TriageError::InvalidInput(
                "cannot roll back while retraining is in progress".into(),
            ));
        }

        let artifact = store.rollback()?;
        let version = artifact.version_id().to_string();
        self.registry.swap(Arc::new(artifact))?;
        Ok(version)
    }
}

impl std::fmt::Debug for DiagnosisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosisEngine")
            .field("model_version", &self.model_version())
            .field("threshold", &self.gate.threshold())
            .finish_non_exhaustive()
    }
}
