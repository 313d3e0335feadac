//! Confidence boosting.
//!
//! Raw classifier probability is adjusted by a fixed multiplicative policy
//! evaluated in this order:
//!
//! 1. symptom count (3, 4, 5+ detected symptoms)
//! 2. known co-occurrence pattern (first match only)
//! 3. duration specificity (non-default durations; acute and chronic boost more)
//! 4. intensity specificity (non-default intensities; severe boosts more)
//! 5. descriptive keywords in the raw text (tiered by count)
//! 6. manual duration/intensity input
//!
//! The product is hard-capped at [`CONFIDENCE_CEILING`]. Every applied factor
//! carries a reason string, kept in evaluation order.

use crate::config::DEFAULT_DURATION_DAYS;
use crate::types::{Intensity, ParsedObservation, SymptomKey};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on any reported confidence
pub const CONFIDENCE_CEILING: f64 = 0.95;

/// Multiplier applied when a known co-occurrence pattern matches
pub const KNOWN_PATTERN_MULTIPLIER: f64 = 1.18;

/// A canonical co-occurring symptom set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPattern {
    pub symptoms: Vec<SymptomKey>,
}

impl KnownPattern {
    pub fn new(symptoms: &[SymptomKey]) -> Self {
        Self {
            symptoms: symptoms.to_vec(),
        }
    }

    pub fn matches(&self, observation: &ParsedObservation) -> bool {
        self.symptoms.iter().all(|key| observation.has(*key))
    }

    pub fn describe(&self) -> String {
        self.symptoms
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// Canonical pattern list, checked in order
pub fn standard_patterns() -> Vec<KnownPattern> {
    use SymptomKey::*;
    [
        &[Fever, Cough, Fatigue][..],
        &[Fever, Cough, ShortnessOfBreath],
        &[LossOfTaste, LossOfSmell],
        &[ChestPain, ShortnessOfBreath],
        &[Headache, Nausea, Dizziness],
        &[Headache, Fever, BodyAches],
        &[Nausea, Diarrhea, Fever],
        &[Nausea, Diarrhea, Fatigue],
        &[SoreThroat, Fever, BodyAches],
        &[RunnyNose, SoreThroat, Cough],
    ]
    .iter()
    .map(|keys| KnownPattern::new(keys))
    .collect()
}

const DESCRIPTIVE_KEYWORDS: &[&str] = &[
    "severe",
    "intense",
    "excruciating",
    "unbearable",
    "persistent",
    "constant",
    "worsening",
    "acute",
    "days",
    "weeks",
    "since",
    "started",
    "began",
    "ongoing",
    "continuing",
    "recurring",
    "exactly",
    "precisely",
    "definitely",
    "clearly",
    "obviously",
    "distinctly",
    "specifically",
];

static DESCRIPTIVE_MATCHERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    DESCRIPTIVE_KEYWORDS
        .iter()
        .map(|w| Regex::new(&format!(r"\b{}\b", regex::escape(w))).expect("Valid keyword regex"))
        .collect()
});

/// Number of distinct descriptive keywords present in the text
pub fn count_descriptive_keywords(text: &str) -> usize {
    let folded = text.to_lowercase();
    DESCRIPTIVE_MATCHERS
        .iter()
        .filter(|re| re.is_match(&folded))
        .count()
}

/// Which rule produced a multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    SymptomCount,
    KnownPattern,
    Duration,
    Intensity,
    DescriptiveKeywords,
    ManualInput,
}

/// One applied multiplier with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostFactor {
    pub kind: FactorKind,
    pub multiplier: f64,
    pub reason: String,
}

impl BoostFactor {
    fn new(kind: FactorKind, multiplier: f64, reason: impl Into<String>) -> Self {
        Self {
            kind,
            multiplier,
            reason: format!("{} (x{:.2})", reason.into(), multiplier),
        }
    }
}

/// Result of boosting one raw probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostOutcome {
    pub raw_probability: f64,
    pub boosted_confidence: f64,
    pub factors: Vec<BoostFactor>,
    /// True when the ceiling clipped the product
    pub capped: bool,
}

impl BoostOutcome {
    pub fn reasons(&self) -> Vec<String> {
        self.factors.iter().map(|f| f.reason.clone()).collect()
    }

    pub fn combined_multiplier(&self) -> f64 {
        self.factors.iter().map(|f| f.multiplier).product()
    }
}

/// Deterministic multi-factor confidence adjuster
#[derive(Debug, Clone)]
pub struct ConfidenceBooster {
    default_duration_days: u32,
    patterns: Vec<KnownPattern>,
}

impl Default for ConfidenceBooster {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_DAYS)
    }
}

impl ConfidenceBooster {
    /// `default_duration_days` must match the parser's default, since a
    /// defaulted duration carries no specificity.
    pub fn new(default_duration_days: u32) -> Self {
        Self {
            default_duration_days,
            patterns: standard_patterns(),
        }
    }

    pub fn with_patterns(mut self, patterns: Vec<KnownPattern>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn patterns(&self) -> &[KnownPattern] {
        &self.patterns
    }

    /// Adjust `raw_probability` using evidence from `observation`
    pub fn boost(&self, raw_probability: f64, observation: &ParsedObservation) -> BoostOutcome {
        let raw = if raw_probability.is_nan() {
            0.0
        } else {
            raw_probability.clamp(0.0, 1.0)
        };

        let factors: Vec<BoostFactor> = [
            self.symptom_count_factor(observation),
            self.pattern_factor(observation),
            self.duration_factor(observation),
            self.intensity_factor(observation),
            self.keyword_factor(observation),
            self.manual_factor(observation),
        ]
        .into_iter()
        .flatten()
        .collect();

        for factor in &factors {
            debug!("Boost factor: {}", factor.reason);
        }

        let product = raw * factors.iter().map(|f| f.multiplier).product::<f64>();
        let capped = product > CONFIDENCE_CEILING;
        let boosted_confidence = product.min(CONFIDENCE_CEILING);

        debug!(
            "Confidence {:.3} -> {:.3} ({} factor(s){})",
            raw,
            boosted_confidence,
            factors.len(),
            if capped { ", capped" } else { "" }
        );

        BoostOutcome {
            raw_probability: raw,
            boosted_confidence,
            factors,
            capped,
        }
    }

    fn symptom_count_factor(&self, observation: &ParsedObservation) -> Option<BoostFactor> {
        let count = observation.symptom_count();
        let multiplier = match count {
            0..=2 => return None,
            3 => 1.08,
            4 => 1.15,
            _ => 1.20,
        };
        Some(BoostFactor::new(
            FactorKind::SymptomCount,
            multiplier,
            format!("{} symptoms detected", count),
        ))
    }

    fn pattern_factor(&self, observation: &ParsedObservation) -> Option<BoostFactor> {
        self.patterns
            .iter()
            .find(|pattern| pattern.matches(observation))
            .map(|pattern| {
                BoostFactor::new(
                    FactorKind::KnownPattern,
                    KNOWN_PATTERN_MULTIPLIER,
                    format!("known pattern: {}", pattern.describe()),
                )
            })
    }

    fn duration_factor(&self, observation: &ParsedObservation) -> Option<BoostFactor> {
        let days = observation.duration_days;
        if days == self.default_duration_days {
            return None;
        }
        let (multiplier, label) = if days <= 2 {
            (1.15, "acute")
        } else if days >= 14 {
            (1.12, "chronic")
        } else {
            (1.08, "specific")
        };
        Some(BoostFactor::new(
            FactorKind::Duration,
            multiplier,
            format!("{} duration of {} day(s)", label, days),
        ))
    }

    fn intensity_factor(&self, observation: &ParsedObservation) -> Option<BoostFactor> {
        let multiplier = match observation.intensity {
            Intensity::Severe => 1.15,
            Intensity::Mild => 1.08,
            Intensity::Moderate => return None,
        };
        Some(BoostFactor::new(
            FactorKind::Intensity,
            multiplier,
            format!("{} intensity reported", observation.intensity),
        ))
    }

    fn keyword_factor(&self, observation: &ParsedObservation) -> Option<BoostFactor> {
        let count = count_descriptive_keywords(&observation.raw_text);
        let multiplier = match count {
            0 => return None,
            1..=2 => 1.06,
            3..=4 => 1.12,
            _ => 1.15,
        };
        Some(BoostFactor::new(
            FactorKind::DescriptiveKeywords,
            multiplier,
            format!("{} descriptive keyword(s)", count),
        ))
    }

    fn manual_factor(&self, observation: &ParsedObservation) -> Option<BoostFactor> {
        let multiplier = match observation.overrides.count() {
            0 => return None,
            1 => 1.05,
            _ => 1.10,
        };
        Some(BoostFactor::new(
            FactorKind::ManualInput,
            multiplier,
            format!(
                "manual input provided ({} value(s))",
                observation.overrides.count()
            ),
        ))
    }
}
