//! Candidate model training and validation.
//!
//! [`Retrainer`] is synchronous and CPU-bound; the feedback loop runs it on a
//! blocking thread under a time budget. It never touches the active artifact:
//! it only produces an accepted candidate or an error.

use super::corpus::{stratified_split, Corpus, TrainingSample};
use crate::config::LearningConfig;
use crate::error::{Result, TriageError};
use crate::features::FeatureSchema;
use crate::model::{ArtifactMetadata, GaussianNaiveBayes, ModelArtifact};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Summary of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainReport {
    pub version_id: String,
    pub accuracy: f64,
    pub sample_count: usize,
    pub feedback_samples: usize,
    pub classes: Vec<String>,
    pub dropped_classes: Vec<String>,
}

/// A trained and validated artifact awaiting activation
#[derive(Debug, Clone)]
pub struct Candidate {
    pub artifact: ModelArtifact,
    pub report: RetrainReport,
}

/// Produces a validated candidate from feedback-labelled samples.
///
/// Runs on a blocking thread and must return promptly once `abort` is set.
pub trait CandidateTrainer: Send + Sync {
    fn train_candidate(
        &self,
        feedback: Vec<TrainingSample>,
        abort: &AtomicBool,
    ) -> Result<Candidate>;
}

/// Fits candidate artifacts from the base corpus plus feedback samples
#[derive(Debug, Clone)]
pub struct Retrainer {
    base: Corpus,
    schema: FeatureSchema,
    config: LearningConfig,
}

impl Retrainer {
    pub fn new(base: Corpus, schema: FeatureSchema, config: LearningConfig) -> Self {
        Self {
            base,
            schema,
            config,
        }
    }

    pub fn base(&self) -> &Corpus {
        &self.base
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Train on the base corpus alone, without enforcing the accuracy floor
    pub fn bootstrap(&self) -> Result<Candidate> {
        self.fit(Vec::new(), None, &AtomicBool::new(false))
    }

    /// Train on base + feedback samples; reject below the accuracy floor
    pub fn train_candidate(
        &self,
        feedback: Vec<TrainingSample>,
        abort: &AtomicBool,
    ) -> Result<Candidate> {
        self.fit(feedback, Some(self.config.accuracy_floor), abort)
    }

    fn fit(
        &self,
        feedback: Vec<TrainingSample>,
        floor: Option<f64>,
        abort: &AtomicBool,
    ) -> Result<Candidate> {
        let feedback_samples = feedback.len();
        let mut corpus = self.base.clone();
        corpus.extend(feedback);

        let dropped_classes = corpus.retain_classes(self.config.min_samples_per_class);
        let dataset = corpus.to_dataset(&self.schema);
        if dataset.labels.len() < 2 {
            return Err(TriageError::InsufficientTrainingData(format!(
                "{} usable class(es) after filtering, need at least 2",
                dataset.labels.len()
            )));
        }

        let split = stratified_split(&dataset, self.config.validation_fraction, self.config.seed)?;
        check_abort(abort)?;

        debug!(
            "Fitting on {} samples, validating on {} ({} classes)",
            split.train_x.len(),
            split.valid_x.len(),
            dataset.labels.len()
        );
        let model =
            GaussianNaiveBayes::fit(&split.train_x, &split.train_y, dataset.labels.len())?;
        let accuracy = model.accuracy(&split.valid_x, &split.valid_y);
        check_abort(abort)?;

        if let Some(floor) = floor {
            if accuracy < floor {
                warn!(
                    "Candidate rejected: validation accuracy {:.3} below floor {:.3}",
                    accuracy, floor
                );
                return Err(TriageError::RetrainRejected { accuracy, floor });
            }
        }

        let version_id = ModelArtifact::new_version_id();
        let artifact = ModelArtifact::new(
            version_id.clone(),
            model,
            dataset.labels.clone(),
            self.schema.clone(),
            ArtifactMetadata {
                trained_at: Utc::now(),
                sample_count: dataset.len(),
                validation_accuracy: Some(accuracy),
            },
        )?;

        info!(
            "Trained candidate {} with accuracy {:.3} on {} samples",
            version_id,
            accuracy,
            dataset.len()
        );

        Ok(Candidate {
            artifact,
            report: RetrainReport {
                version_id,
                accuracy,
                sample_count: dataset.len(),
                feedback_samples,
                classes: dataset.labels.labels().to_vec(),
                dropped_classes,
            },
        })
    }
}

impl CandidateTrainer for Retrainer {
    fn train_candidate(
        &self,
        feedback: Vec<TrainingSample>,
        abort: &AtomicBool,
    ) -> Result<Candidate> {
        Retrainer::train_candidate(self, feedback, abort)
    }
}

fn check_abort(abort: &AtomicBool) -> Result<()> {
    if abort.load(Ordering::SeqCst) {
        return Err(TriageError::RetrainAborted("abort requested".into()));
    }
    Ok(())
}
