//! Free-text symptom parsing.
//!
//! Turns a natural-language description into a [`ParsedObservation`]:
//! the set of detected symptom keys, a duration in days, and an intensity.
//!
//! # Totality
//!
//! [`SymptomParser::parse`] never fails. Empty or unrecognizable input yields
//! an observation with no symptoms, the configured default duration, and
//! moderate intensity.
//!
//! # Manual input
//!
//! Callers may pass explicit duration/intensity values. These replace the
//! parsed values and are flagged in [`ParsedObservation::overrides`] so the
//! confidence booster can account for them.

pub mod duration;
pub mod intensity;
pub mod vocabulary;

pub use vocabulary::SymptomVocabulary;

use crate::config::ParserConfig;
use crate::types::{Intensity, ManualInput, ManualOverrides, ParsedObservation};
use std::sync::Arc;
use tracing::debug;

/// Natural-language symptom parser
#[derive(Clone)]
pub struct SymptomParser {
    vocabulary: Arc<SymptomVocabulary>,
    default_duration_days: u32,
}

impl Default for SymptomParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl SymptomParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            vocabulary: SymptomVocabulary::standard(),
            default_duration_days: config.default_duration_days,
        }
    }

    /// Use a caller-provided vocabulary instead of the built-in table
    pub fn with_vocabulary(mut self, vocabulary: Arc<SymptomVocabulary>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn default_duration_days(&self) -> u32 {
        self.default_duration_days
    }

    /// Parse free text plus optional explicit values
    pub fn parse(&self, text: &str, manual: ManualInput) -> ParsedObservation {
        let folded = fold(text);

        let symptoms = self.vocabulary.detect(&folded);

        let duration_days = match manual.duration_days {
            Some(days) => days,
            None => match duration::extract_days(&folded) {
                Some((days, pattern)) => {
                    debug!("Duration {} days from pattern '{}'", days, pattern);
                    days
                }
                None => self.default_duration_days,
            },
        };

        let intensity = match manual.intensity {
            Some(intensity) => intensity,
            None => intensity::score(&folded).winner(),
        };

        let overrides = ManualOverrides {
            duration: manual.duration_days.is_some(),
            intensity: manual.intensity.is_some(),
        };

        debug!(
            "Parsed {} symptom(s), {} days, {} intensity (overrides: {})",
            symptoms.len(),
            duration_days,
            intensity,
            overrides.count()
        );

        ParsedObservation {
            symptoms,
            duration_days,
            intensity,
            raw_text: text.to_string(),
            overrides,
        }
    }

    /// Interpret a free-text duration hint such as "3 days" or "a week".
    /// A bare number is read as days.
    pub fn parse_duration_hint(&self, hint: &str) -> Option<u32> {
        let folded = fold(hint);
        if let Ok(days) = folded.trim().parse::<u32>() {
            return Some(days);
        }
        duration::extract_days(&folded).map(|(days, _)| days)
    }

    /// Interpret a free-text intensity hint such as "severe" or "really bad"
    pub fn parse_intensity_hint(&self, hint: &str) -> Option<Intensity> {
        if let Ok(intensity) = hint.parse::<Intensity>() {
            return Some(intensity);
        }
        let scores = intensity::score(&fold(hint));
        (!scores.is_empty()).then(|| scores.winner())
    }
}

impl std::fmt::Debug for SymptomParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymptomParser")
            .field("default_duration_days", &self.default_duration_days)
            .finish_non_exhaustive()
    }
}

/// Case-fold and normalize typographic apostrophes
fn fold(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}
