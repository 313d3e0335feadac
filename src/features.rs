//! Feature vector construction.
//!
//! A [`FeatureSchema`] is the ordered list of input dimensions a classifier
//! was trained on. [`build`] maps an observation onto that order: symptom
//! dimensions get 1.0/0.0, `duration_days` gets the raw day count,
//! `intensity` gets its fixed encoding, and anything else stays 0.

use crate::error::{Result, TriageError};
use crate::types::{ParsedObservation, SymptomKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DURATION_FEATURE: &str = "duration_days";
pub const INTENSITY_FEATURE: &str = "intensity";

/// Ordered feature names expected by a classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema(Vec<String>);

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// Every known symptom followed by duration and intensity
    pub fn standard() -> Self {
        let mut names: Vec<String> = SymptomKey::ALL.iter().map(|k| k.to_string()).collect();
        names.push(DURATION_FEATURE.to_string());
        names.push(INTENSITY_FEATURE.to_string());
        Self(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }
}

/// Numeric input for the classifier, aligned 1:1 with a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fail unless the vector lines up with `schema`
    pub fn check_against(&self, schema: &FeatureSchema) -> Result<()> {
        if self.0.len() != schema.len() {
            return Err(TriageError::SchemaMismatch {
                expected: schema.len(),
                actual: self.0.len(),
            });
        }
        Ok(())
    }

    /// Name/value pairs for display and logging
    pub fn named<'a>(&'a self, schema: &'a FeatureSchema) -> Vec<(&'a str, f64)> {
        schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.0.iter().copied())
            .collect()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Map an observation onto the schema's dimension order
pub fn build(observation: &ParsedObservation, schema: &FeatureSchema) -> FeatureVector {
    let values = schema
        .names()
        .iter()
        .map(|name| match name.as_str() {
            DURATION_FEATURE => f64::from(observation.duration_days),
            INTENSITY_FEATURE => observation.intensity.encoding(),
            other => match other.parse::<SymptomKey>() {
                Ok(key) if observation.has(key) => 1.0,
                Ok(_) => 0.0,
                Err(_) => {
                    debug!("Schema dimension '{}' not recognized, defaulting to 0", other);
                    0.0
                }
            },
        })
        .collect();

    FeatureVector(values)
}
