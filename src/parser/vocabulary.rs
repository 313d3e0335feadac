//! Keyword-to-symptom synonym table.
//!
//! Each symptom key owns a list of lowercase keyword variants. Matching is
//! word-boundary based, so "hot" does not fire inside "shot" and "beat" does
//! not fire inside "heartbeat".

use crate::error::{Result, TriageError};
use crate::types::SymptomKey;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;

static STANDARD: Lazy<Arc<SymptomVocabulary>> = Lazy::new(|| {
    Arc::new(
        SymptomVocabulary::from_entries(STANDARD_ENTRIES)
            .expect("Valid built-in symptom vocabulary"),
    )
});

const STANDARD_ENTRIES: &[(SymptomKey, &[&str])] = &[
    (
        SymptomKey::Fever,
        &[
            "fever", "feverish", "high temperature", "temperature", "high temp", "hot",
            "burning up", "chills", "hot flashes", "pyrexia", "febrile", "overheated",
            "elevated temperature", "running a fever",
        ],
    ),
    (
        SymptomKey::Cough,
        &[
            "cough", "coughing", "hack", "hacking", "dry cough", "wet cough", "productive cough",
            "persistent cough", "barking cough", "chronic cough", "whooping", "phlegm", "mucus",
            "chest congestion", "tickle in throat",
        ],
    ),
    (
        SymptomKey::Fatigue,
        &[
            "tired", "fatigue", "fatigued", "exhausted", "exhaustion", "weakness", "weak", "weary",
            "drained", "lethargic", "sleepy", "worn out", "no energy", "lack of energy",
            "energy loss", "run down", "wiped out", "depleted",
        ],
    ),
    (
        SymptomKey::ShortnessOfBreath,
        &[
            "shortness of breath", "short of breath", "breathless", "breathing difficulty",
            "difficulty breathing", "trouble breathing", "hard to breathe", "can't breathe",
            "winded", "dyspnea", "gasping", "out of breath", "labored breathing", "air hunger",
            "wheezing",
        ],
    ),
    (
        SymptomKey::Headache,
        &[
            "headache", "headaches", "head pain", "head ache", "migraine", "head hurts",
            "head pressure", "skull pain", "temple pain", "forehead pain", "tension headache",
            "cluster headache", "throbbing head", "pounding head", "cephalgia",
        ],
    ),
    (
        SymptomKey::SoreThroat,
        &[
            "sore throat", "throat pain", "scratchy throat", "throat hurts", "swollen throat",
            "raw throat", "burning throat", "irritated throat", "throat irritation",
            "painful swallowing", "pharyngitis",
        ],
    ),
    (
        SymptomKey::Nausea,
        &[
            "nausea", "nauseous", "nauseated", "queasy", "sick to stomach", "feeling sick",
            "want to vomit", "vomiting", "upset stomach", "stomach churning",
            "feel like throwing up",
        ],
    ),
    (
        SymptomKey::Dizziness,
        &[
            "dizzy", "dizziness", "lightheaded", "light headed", "vertigo", "room spinning",
            "head spinning", "unsteady", "off balance", "balance problems", "faint feeling",
        ],
    ),
    (
        SymptomKey::BodyAches,
        &[
            "body aches", "body ache", "muscle aches", "muscle ache", "muscle pain", "joint pain",
            "joint aches", "aching", "myalgia", "muscle soreness", "all over pain",
            "generalized pain", "stiffness",
        ],
    ),
    (
        SymptomKey::RunnyNose,
        &[
            "runny nose", "nose running", "nasal discharge", "stuffy nose", "blocked nose",
            "nasal congestion", "stuffed up", "sniffles", "post nasal drip", "rhinorrhea",
            "congestion",
        ],
    ),
    (
        SymptomKey::ChestPain,
        &[
            "chest pain", "chest discomfort", "chest tightness", "chest pressure",
            "chest burning", "sharp chest pain", "heart pain", "sternum pain", "ribcage pain",
        ],
    ),
    (
        SymptomKey::Diarrhea,
        &[
            "diarrhea", "diarrhoea", "loose stools", "watery stools", "runny stools",
            "liquid stool", "loose bowel movements", "frequent bowel", "frequent bathroom trips",
        ],
    ),
    (
        SymptomKey::LossOfTaste,
        &[
            "loss of taste", "lost my taste", "can't taste", "no taste", "taste gone",
            "taste loss", "ageusia", "food tasteless", "altered taste",
        ],
    ),
    (
        SymptomKey::LossOfSmell,
        &[
            "loss of smell", "lost my smell", "can't smell", "no smell", "smell gone",
            "smell loss", "anosmia", "odor loss",
        ],
    ),
];

struct VocabularyEntry {
    key: SymptomKey,
    keywords: Vec<String>,
    matcher: Option<Regex>,
}

/// Static symptom vocabulary, loaded once and read-only thereafter
pub struct SymptomVocabulary {
    entries: Vec<VocabularyEntry>,
}

impl SymptomVocabulary {
    /// The built-in vocabulary shared by every parser
    pub fn standard() -> Arc<SymptomVocabulary> {
        Arc::clone(&STANDARD)
    }

    /// Build a vocabulary from custom keyword lists
    pub fn from_entries(entries: &[(SymptomKey, &[&str])]) -> Result<Self> {
        let entries = entries
            .iter()
            .map(|(key, keywords)| {
                let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
                let matcher = keyword_matcher(&keywords)?;
                Ok(VocabularyEntry {
                    key: *key,
                    keywords,
                    matcher,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Detect symptom keys in already case-folded text
    pub fn detect(&self, folded_text: &str) -> BTreeSet<SymptomKey> {
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .matcher
                    .as_ref()
                    .is_some_and(|matcher| matcher.is_match(folded_text))
            })
            .map(|entry| entry.key)
            .collect()
    }

    /// Keyword variants registered for a symptom key
    pub fn keywords(&self, key: SymptomKey) -> &[String] {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.keywords.as_slice())
            .unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = SymptomKey> + '_ {
        self.entries.iter().map(|entry| entry.key)
    }
}

/// Compile keyword variants into one word-bounded alternation.
/// An empty keyword list yields no matcher.
pub(crate) fn keyword_matcher(keywords: &[String]) -> Result<Option<Regex>> {
    if keywords.is_empty() {
        return Ok(None);
    }
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternation))
        .map(Some)
        .map_err(|e| TriageError::Parse(e.to_string()))
}
