//! Common test utilities and helpers

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use triage_core::config::LearningConfig;
use triage_core::engine::EngineComponents;
use triage_core::learning::{Corpus, EventStore, FeedbackInput, Retrainer, TrainingSample};
use triage_core::model::ModelRegistry;
use triage_core::{
    DiagnosisEngine, FeatureSchema, Intensity, ManualInput, StaticRecommendations, SymptomKey,
    TriageConfig,
};

/// Path to a file shipped under `data/`
pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

/// Configuration rooted in a fresh temp dir, using the shipped base corpus
pub fn create_test_config() -> (TriageConfig, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = TriageConfig::default().with_root(temp_dir.path());
    config.storage.base_corpus = data_path("base_corpus.json");
    config.storage.recommendations = data_path("recommendations.json");
    (config, temp_dir)
}

/// On-disk engine over a temp dir
pub async fn create_test_engine(config: &TriageConfig) -> DiagnosisEngine {
    DiagnosisEngine::open(config)
        .await
        .expect("Failed to open test engine")
}

/// In-memory engine trained on `corpus`
pub fn create_memory_engine(config: &TriageConfig, corpus: Corpus) -> DiagnosisEngine {
    let retrainer = Retrainer::new(corpus, FeatureSchema::standard(), config.learning.clone());
    let artifact = retrainer
        .bootstrap()
        .expect("Failed to bootstrap test artifact")
        .artifact;

    DiagnosisEngine::new(
        config,
        EngineComponents {
            registry: Arc::new(ModelRegistry::with_artifact(artifact)),
            events: EventStore::in_memory(),
            store: None,
            retrainer,
            recommendations: Arc::new(StaticRecommendations::empty()),
        },
    )
}

pub fn shipped_corpus() -> Corpus {
    Corpus::load(&data_path("base_corpus.json")).expect("Failed to load shipped corpus")
}

/// Two labels over identical inputs; no model can score above 50% on it
pub fn contradictory_corpus() -> Corpus {
    let sample = |label: &str| TrainingSample {
        label: label.to_string(),
        symptoms: [SymptomKey::Fever].into_iter().collect(),
        duration_days: 7,
        intensity: Intensity::Moderate,
    };
    let mut samples = Vec::new();
    for _ in 0..5 {
        samples.push(sample("Condition A"));
        samples.push(sample("Condition B"));
    }
    Corpus::new(samples)
}

pub fn learning_config(trigger_threshold: usize, accuracy_floor: f64) -> LearningConfig {
    LearningConfig {
        trigger_threshold,
        accuracy_floor,
        ..LearningConfig::default()
    }
}

/// Diagnose `text` and confirm it with `label`, returning whether a retrain fired
pub async fn diagnose_and_confirm(engine: &DiagnosisEngine, text: &str, label: &str) -> bool {
    let report = engine
        .diagnose(text, ManualInput::none())
        .await
        .expect("Diagnosis failed");
    engine
        .record_feedback(FeedbackInput::labelled(report.session_id.as_str(), label))
        .await
        .expect("Feedback failed")
        .retrain_triggered
}
