//! Labelled training data.
//!
//! The base corpus is a JSON array of samples:
//!
//! ```json
//! [{"label": "Influenza", "symptoms": ["fever", "cough"], "duration_days": 4, "intensity": "severe"}]
//! ```
//!
//! Feedback-labelled observations are appended to it before each retrain.

use crate::config::DEFAULT_DURATION_DAYS;
use crate::error::{Result, TriageError};
use crate::features::{self, FeatureSchema};
use crate::model::LabelSpace;
use crate::types::{Intensity, ManualOverrides, ParsedObservation, SymptomKey};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

fn default_duration() -> u32 {
    DEFAULT_DURATION_DAYS
}

/// One labelled example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub label: String,
    pub symptoms: BTreeSet<SymptomKey>,
    #[serde(default = "default_duration")]
    pub duration_days: u32,
    #[serde(default)]
    pub intensity: Intensity,
}

impl TrainingSample {
    pub fn from_observation(observation: &ParsedObservation, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            symptoms: observation.symptoms.clone(),
            duration_days: observation.duration_days,
            intensity: observation.intensity,
        }
    }

    pub fn to_observation(&self) -> ParsedObservation {
        ParsedObservation {
            symptoms: self.symptoms.clone(),
            duration_days: self.duration_days,
            intensity: self.intensity,
            raw_text: String::new(),
            overrides: ManualOverrides::default(),
        }
    }
}

/// Numeric training set aligned with a schema and label space
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<usize>,
    pub labels: LabelSpace,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Train/validation partition of a dataset
#[derive(Debug, Clone)]
pub struct Split {
    pub train_x: Vec<Vec<f64>>,
    pub train_y: Vec<usize>,
    pub valid_x: Vec<Vec<f64>>,
    pub valid_y: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    samples: Vec<TrainingSample>,
}

impl Corpus {
    pub fn new(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }

    /// Read a JSON corpus file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            TriageError::NotFound(format!("training corpus {}: {}", path.display(), e))
        })?;
        let corpus: Corpus = serde_json::from_slice(&bytes)?;
        info!(
            "Loaded {} training samples from {}",
            corpus.len(),
            path.display()
        );
        Ok(corpus)
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = TrainingSample>) {
        self.samples.extend(samples);
    }

    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Drop every class with fewer than `min` samples, returning the dropped labels
    pub fn retain_classes(&mut self, min: usize) -> Vec<String> {
        let dropped: Vec<String> = self
            .label_counts()
            .into_iter()
            .filter(|(_, count)| *count < min)
            .map(|(label, _)| label)
            .collect();
        if !dropped.is_empty() {
            debug!("Dropping under-populated classes: {:?}", dropped);
            self.samples.retain(|s| !dropped.contains(&s.label));
        }
        dropped
    }

    /// Encode samples against `schema` with a label space built from the data
    pub fn to_dataset(&self, schema: &FeatureSchema) -> Dataset {
        let labels = LabelSpace::from_labels(self.samples.iter().map(|s| s.label.clone()));
        let mut x = Vec::with_capacity(self.samples.len());
        let mut y = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            if let Some(index) = labels.index_of(&sample.label) {
                x.push(features::build(&sample.to_observation(), schema).values().to_vec());
                y.push(index);
            }
        }
        Dataset { x, y, labels }
    }
}

/// Per-class shuffled split.
///
/// Each class sends `max(1, round(n * fraction))` samples to validation, capped
/// so at least one stays in training. Classes need two or more samples.
pub fn stratified_split(dataset: &Dataset, fraction: f64, seed: u64) -> Result<Split> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &class) in dataset.y.iter().enumerate() {
        by_class.entry(class).or_default().push(row);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train_x: Vec::new(),
        train_y: Vec::new(),
        valid_x: Vec::new(),
        valid_y: Vec::new(),
    };

    for (class, mut rows) in by_class {
        if rows.len() < 2 {
            return Err(TriageError::InsufficientTrainingData(format!(
                "class '{}' has {} sample(s), need at least 2 to split",
                dataset.labels.name(class).unwrap_or("?"),
                rows.len()
            )));
        }
        rows.shuffle(&mut rng);
        let n_valid = ((rows.len() as f64 * fraction).round() as usize).clamp(1, rows.len() - 1);
        for (i, row) in rows.into_iter().enumerate() {
            let (xs, ys) = if i < n_valid {
                (&mut split.valid_x, &mut split.valid_y)
            } else {
                (&mut split.train_x, &mut split.train_y)
            };
            xs.push(dataset.x[row].clone());
            ys.push(class);
        }
    }

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(label: &str, symptoms: &[SymptomKey], days: u32) -> TrainingSample {
        TrainingSample {
            label: label.to_string(),
            symptoms: symptoms.iter().copied().collect(),
            duration_days: days,
            intensity: Intensity::Moderate,
        }
    }

    fn corpus() -> Corpus {
        let mut samples = Vec::new();
        for days in 1..=5 {
            samples.push(sample("Influenza", &[SymptomKey::Fever, SymptomKey::Cough], days));
            samples.push(sample("Migraine", &[SymptomKey::Headache], days + 1));
        }
        samples.push(sample("Rare", &[SymptomKey::ChestPain], 3));
        Corpus::new(samples)
    }

    #[test]
    fn test_load_applies_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corpus.json");
        std::fs::write(&path, r#"[{"label": "Allergies", "symptoms": ["runny_nose"]}]"#).unwrap();

        let corpus = Corpus::load(&path).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.samples()[0].duration_days, DEFAULT_DURATION_DAYS);
        assert_eq!(corpus.samples()[0].intensity, Intensity::Moderate);

        assert!(matches!(
            Corpus::load(&temp_dir.path().join("missing.json")),
            Err(TriageError::NotFound(_))
        ));
    }

    #[test]
    fn test_retain_classes_drops_singletons() {
        let mut corpus = corpus();
        let dropped = corpus.retain_classes(2);
        assert_eq!(dropped, vec!["Rare".to_string()]);
        assert_eq!(corpus.len(), 10);
        assert!(!corpus.label_counts().contains_key("Rare"));
    }

    #[test]
    fn test_dataset_encoding() {
        let mut corpus = corpus();
        corpus.retain_classes(2);
        let schema = FeatureSchema::standard();
        let dataset = corpus.to_dataset(&schema);
        assert_eq!(dataset.len(), 10);
        assert_eq!(dataset.labels.labels(), &["Influenza", "Migraine"]);
        assert!(dataset.x.iter().all(|row| row.len() == schema.len()));
    }

    #[test]
    fn test_split_is_stratified_and_seeded() {
        let mut corpus = corpus();
        corpus.retain_classes(2);
        let dataset = corpus.to_dataset(&FeatureSchema::standard());

        let split = stratified_split(&dataset, 0.2, 7).unwrap();
        assert_eq!(split.valid_y.iter().filter(|&&c| c == 0).count(), 1);
        assert_eq!(split.valid_y.iter().filter(|&&c| c == 1).count(), 1);
        assert_eq!(split.train_x.len() + split.valid_x.len(), 10);

        let again = stratified_split(&dataset, 0.2, 7).unwrap();
        assert_eq!(split.valid_x, again.valid_x);
    }

    #[test]
    fn test_split_rejects_singleton_class() {
        let dataset = corpus().to_dataset(&FeatureSchema::standard());
        assert!(matches!(
            stratified_split(&dataset, 0.2, 1),
            Err(TriageError::InsufficientTrainingData(_))
        ));
    }
}
