//! Versioned model artifact: classifier, label space, and feature schema.

use super::classifier::GaussianNaiveBayes;
use crate::error::{Result, TriageError};
use crate::features::{FeatureSchema, FeatureVector};
use crate::types::RankedLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered class names; position is the classifier's class index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSpace(Vec<String>);

impl LabelSpace {
    /// Build a label space from arbitrary labels, sorted and deduplicated
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = labels.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.0.iter().position(|l| l == label)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

/// Provenance recorded alongside a trained classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub trained_at: DateTime<Utc>,
    pub sample_count: usize,
    pub validation_accuracy: Option<f64>,
}

/// Classifier output for one feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutput {
    pub label: String,
    pub probability: f64,
    /// Every label with its probability, most probable first
    pub distribution: Vec<RankedLabel>,
}

impl ClassifierOutput {
    /// Up to `limit` runner-up labels, primary excluded
    pub fn alternatives(&self, limit: usize) -> Vec<RankedLabel> {
        self.distribution.iter().skip(1).take(limit).cloned().collect()
    }
}

/// Immutable bundle of classifier, label space, and schema sharing one version
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    version_id: String,
    classifier: GaussianNaiveBayes,
    labels: LabelSpace,
    schema: FeatureSchema,
    metadata: ArtifactMetadata,
}

impl ModelArtifact {
    /// Assemble an artifact, rejecting parts whose dimensions disagree
    pub fn new(
        version_id: impl Into<String>,
        classifier: GaussianNaiveBayes,
        labels: LabelSpace,
        schema: FeatureSchema,
        metadata: ArtifactMetadata,
    ) -> Result<Self> {
        let version_id = version_id.into();
        if classifier.n_classes() != labels.len() {
            return Err(TriageError::ModelUnavailable(format!(
                "artifact {} has {} classes but {} labels",
                version_id,
                classifier.n_classes(),
                labels.len()
            )));
        }
        if classifier.n_features() != schema.len() {
            return Err(TriageError::ModelUnavailable(format!(
                "artifact {} has {} features but schema lists {}",
                version_id,
                classifier.n_features(),
                schema.len()
            )));
        }

        Ok(Self {
            version_id,
            classifier,
            labels,
            schema,
            metadata,
        })
    }

    /// Fresh version id: UTC timestamp plus a short random suffix
    pub fn new_version_id() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S"), &suffix[..8])
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn classifier(&self) -> &GaussianNaiveBayes {
        &self.classifier
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// Classify one vector built against this artifact's schema
    pub fn predict(&self, vector: &FeatureVector) -> Result<ClassifierOutput> {
        vector.check_against(&self.schema)?;

        let proba = self.classifier.predict_proba(vector.values());
        let mut distribution: Vec<RankedLabel> = self
            .labels
            .labels()
            .iter()
            .zip(proba)
            .map(|(label, confidence)| RankedLabel {
                label: label.clone(),
                confidence,
            })
            .collect();
        distribution.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.label.cmp(&b.label))
        });

        let top = distribution.first().cloned().ok_or_else(|| {
            TriageError::ModelUnavailable(format!("artifact {} has no labels", self.version_id))
        })?;

        Ok(ClassifierOutput {
            label: top.label,
            probability: top.confidence,
            distribution,
        })
    }
}
