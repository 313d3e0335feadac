//! Core data types for the triage pipeline
//!
//! These types flow between the parser, feature builder, classifier, booster,
//! and gate. The parser produces exactly one [`ParsedObservation`] per call and
//! every downstream stage consumes that same shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for a clinical symptom
///
/// The variant order is the canonical feature order used when a fresh
/// schema is built from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomKey {
    Fever,
    Cough,
    Fatigue,
    ShortnessOfBreath,
    Headache,
    SoreThroat,
    Nausea,
    Dizziness,
    BodyAches,
    RunnyNose,
    ChestPain,
    Diarrhea,
    LossOfTaste,
    LossOfSmell,
}

impl SymptomKey {
    /// All symptom keys in canonical order
    pub const ALL: [SymptomKey; 14] = [
        SymptomKey::Fever,
        SymptomKey::Cough,
        SymptomKey::Fatigue,
        SymptomKey::ShortnessOfBreath,
        SymptomKey::Headache,
        SymptomKey::SoreThroat,
        SymptomKey::Nausea,
        SymptomKey::Dizziness,
        SymptomKey::BodyAches,
        SymptomKey::RunnyNose,
        SymptomKey::ChestPain,
        SymptomKey::Diarrhea,
        SymptomKey::LossOfTaste,
        SymptomKey::LossOfSmell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SymptomKey::Fever => "fever",
            SymptomKey::Cough => "cough",
            SymptomKey::Fatigue => "fatigue",
            SymptomKey::ShortnessOfBreath => "shortness_of_breath",
            SymptomKey::Headache => "headache",
            SymptomKey::SoreThroat => "sore_throat",
            SymptomKey::Nausea => "nausea",
            SymptomKey::Dizziness => "dizziness",
            SymptomKey::BodyAches => "body_aches",
            SymptomKey::RunnyNose => "runny_nose",
            SymptomKey::ChestPain => "chest_pain",
            SymptomKey::Diarrhea => "diarrhea",
            SymptomKey::LossOfTaste => "loss_of_taste",
            SymptomKey::LossOfSmell => "loss_of_smell",
        }
    }
}

impl std::fmt::Display for SymptomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymptomKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymptomKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown symptom key: {}", s))
    }
}

/// Reported symptom intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Mild,
    #[default]
    Moderate,
    Severe,
}

impl Intensity {
    /// Fixed numeric encoding used in the feature vector
    pub fn encoding(&self) -> f64 {
        match self {
            Intensity::Mild => 1.0,
            Intensity::Moderate => 2.0,
            Intensity::Severe => 3.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Mild => "mild",
            Intensity::Moderate => "moderate",
            Intensity::Severe => "severe",
        }
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mild" => Ok(Intensity::Mild),
            "moderate" => Ok(Intensity::Moderate),
            "severe" => Ok(Intensity::Severe),
            other => Err(format!("unknown intensity: {}", other)),
        }
    }
}

/// Values the caller supplied explicitly instead of relying on the parser
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualInput {
    pub duration_days: Option<u32>,
    pub intensity: Option<Intensity>,
}

impl ManualInput {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.duration_days.is_none() && self.intensity.is_none()
    }
}

/// Which parsed values came from explicit caller hints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverrides {
    pub duration: bool,
    pub intensity: bool,
}

impl ManualOverrides {
    pub fn count(&self) -> usize {
        usize::from(self.duration) + usize::from(self.intensity)
    }
}

/// Normalized observation produced by the symptom parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedObservation {
    pub symptoms: BTreeSet<SymptomKey>,
    pub duration_days: u32,
    pub intensity: Intensity,
    pub raw_text: String,
    #[serde(default)]
    pub overrides: ManualOverrides,
}

impl ParsedObservation {
    pub fn symptom_count(&self) -> usize {
        self.symptoms.len()
    }

    pub fn has(&self, key: SymptomKey) -> bool {
        self.symptoms.contains(&key)
    }
}

/// Opaque identifier linking a prediction to later feedback
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A label with its confidence on the internal 0..1 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLabel {
    pub label: String,
    pub confidence: f64,
}

/// Classifier output after confidence boosting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
    pub raw_probability: f64,
    pub boosted_confidence: f64,
    /// Other labels ranked by raw probability, primary excluded
    pub alternatives: Vec<RankedLabel>,
    /// Human-readable reasons, in evaluation order
    pub boost_factors: Vec<String>,
    pub model_version: String,
}

impl PredictionResult {
    /// Boundary conversion to the 0..100 scale used by presentation layers
    pub fn confidence_percent(&self) -> f64 {
        self.boosted_confidence * 100.0
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.boosted_confidence)
    }
}

/// Coarse human-readable confidence band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Moderate,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.85 {
            ConfidenceLevel::VeryHigh
        } else if confidence >= 0.75 {
            ConfidenceLevel::High
        } else if confidence >= 0.60 {
            ConfidenceLevel::Medium
        } else if confidence >= 0.45 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::VeryHigh => write!(f, "Very High"),
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Moderate => write!(f, "Moderate"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}
