//! Unknown-case gate.
//!
//! A pure threshold on boosted confidence: at or above the threshold the
//! prediction is presented as-is, below it the label is withheld and a
//! structured advisory recommending professional evaluation is returned
//! instead.

use crate::config::DEFAULT_UNKNOWN_THRESHOLD;
use crate::types::{Intensity, ParsedObservation, PredictionResult, SymptomKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const ADVISORY_MESSAGE: &str = "The symptom pattern could not be matched with enough confidence \
to suggest a specific condition. Please consult a healthcare professional for proper evaluation.";

pub const DISCLAIMER: &str = "This assessment is informational only and is not a medical \
diagnosis. Always seek the advice of a qualified healthcare provider.";

/// Advisory emitted in place of a low-confidence diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownCaseAdvisory {
    pub message: String,
    pub confidence: f64,
    pub threshold: f64,
    pub symptoms: Vec<SymptomKey>,
    pub suggested_actions: Vec<String>,
    /// Reported symptoms that warrant prompt in-person care
    pub urgent_indicators: Vec<String>,
    pub disclaimer: String,
    pub model_version: String,
}

impl UnknownCaseAdvisory {
    pub fn is_urgent(&self) -> bool {
        !self.urgent_indicators.is_empty()
    }
}

/// Gate decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriageOutcome {
    Known(PredictionResult),
    Unknown(UnknownCaseAdvisory),
}

impl TriageOutcome {
    pub fn is_unknown(&self) -> bool {
        matches!(self, TriageOutcome::Unknown(_))
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        match self {
            TriageOutcome::Known(prediction) => Some(prediction),
            TriageOutcome::Unknown(_) => None,
        }
    }

    pub fn advisory(&self) -> Option<&UnknownCaseAdvisory> {
        match self {
            TriageOutcome::Known(_) => None,
            TriageOutcome::Unknown(advisory) => Some(advisory),
        }
    }
}

/// Two-state confidence gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnknownCaseGate {
    threshold: f64,
}

impl Default for UnknownCaseGate {
    fn default() -> Self {
        Self::new(DEFAULT_UNKNOWN_THRESHOLD)
    }
}

impl UnknownCaseGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_known(&self, confidence: f64) -> bool {
        confidence >= self.threshold
    }

    /// Route a boosted prediction to the known or unknown branch
    pub fn decide(&self, prediction: PredictionResult, observation: &ParsedObservation) -> TriageOutcome {
        if self.is_known(prediction.boosted_confidence) {
            debug!(
                "Known case: {} at {:.3} (threshold {:.2})",
                prediction.label, prediction.boosted_confidence, self.threshold
            );
            return TriageOutcome::Known(prediction);
        }

        warn!(
            "Unknown case: confidence {:.3} below threshold {:.2}, label withheld",
            prediction.boosted_confidence, self.threshold
        );
        TriageOutcome::Unknown(UnknownCaseAdvisory {
            message: ADVISORY_MESSAGE.to_string(),
            confidence: prediction.boosted_confidence,
            threshold: self.threshold,
            symptoms: observation.symptoms.iter().copied().collect(),
            suggested_actions: suggested_actions(),
            urgent_indicators: urgent_indicators(observation),
            disclaimer: DISCLAIMER.to_string(),
            model_version: prediction.model_version,
        })
    }
}

fn suggested_actions() -> Vec<String> {
    [
        "Consult a healthcare professional for proper evaluation",
        "Provide a complete list of your symptoms and when they started",
        "Seek emergency care if symptoms are severe or rapidly worsening",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn urgent_indicators(observation: &ParsedObservation) -> Vec<String> {
    let mut indicators = Vec::new();
    if observation.has(SymptomKey::ShortnessOfBreath) {
        indicators.push("Shortness of breath".to_string());
    }
    if observation.has(SymptomKey::ChestPain) {
        indicators.push("Chest pain".to_string());
    }
    if observation.has(SymptomKey::Headache) && observation.intensity == Intensity::Severe {
        indicators.push("Severe headache".to_string());
    }
    indicators
}
