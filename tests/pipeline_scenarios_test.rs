//! End-to-end diagnosis pipeline scenarios

mod common;

use common::{create_memory_engine, create_test_config, create_test_engine, shipped_corpus};
use std::sync::Arc;
use triage_core::booster::FactorKind;
use triage_core::features;
use triage_core::learning::AppendLog;
use triage_core::{
    ConfidenceBooster, FeatureSchema, Intensity, ManualInput, SymptomKey, SymptomParser,
    TriageConfig, TriageOutcome,
};

#[test]
fn test_scenario_descriptive_text() {
    let text = "severe headache and fever for 3 days, feeling very tired";
    let observation = SymptomParser::default().parse(text, ManualInput::none());

    let expected = vec![SymptomKey::Fever, SymptomKey::Fatigue, SymptomKey::Headache];
    assert_eq!(observation.symptoms.iter().copied().collect::<Vec<_>>(), expected);
    assert_eq!(observation.duration_days, 3);
    assert_eq!(observation.intensity, Intensity::Severe);

    let outcome = ConfidenceBooster::default().boost(0.55, &observation);
    assert!(outcome.boosted_confidence > outcome.raw_probability);

    let kinds: Vec<FactorKind> = outcome.factors.iter().map(|f| f.kind).collect();
    assert!(kinds.contains(&FactorKind::SymptomCount));
    assert!(kinds.contains(&FactorKind::Duration));
    assert!(kinds.contains(&FactorKind::Intensity));
}

#[test]
fn test_scenario_empty_text() {
    let observation = SymptomParser::default().parse("", ManualInput::none());
    assert!(observation.symptoms.is_empty());
    assert_eq!(observation.duration_days, 7);
    assert_eq!(observation.intensity, Intensity::Moderate);

    let schema = FeatureSchema::standard();
    let vector = features::build(&observation, &schema);
    assert_eq!(vector.len(), schema.len());
    for (name, value) in vector.named(&schema) {
        let expected = match name {
            "duration_days" => 7.0,
            "intensity" => 2.0,
            _ => 0.0,
        };
        assert_eq!(value, expected, "dimension {}", name);
    }

    let outcome = ConfidenceBooster::default().boost(0.37, &observation);
    assert_eq!(outcome.boosted_confidence, 0.37);
    assert!(outcome.factors.is_empty());
}

#[test]
fn test_empty_text_through_engine_applies_no_factors() {
    let engine = create_memory_engine(&TriageConfig::default(), shipped_corpus());
    let assessment = engine.assess("", ManualInput::none()).unwrap();
    let prediction = &assessment.prediction;
    assert!(prediction.boost_factors.is_empty());
    assert_eq!(prediction.boosted_confidence, prediction.raw_probability.min(0.95));
}

#[test]
fn test_shipped_corpus_predicts_expected_labels() {
    let engine = create_memory_engine(&TriageConfig::default(), shipped_corpus());
    let cases = [
        ("runny nose and a sore throat for 3 days, mild", "Common Cold"),
        ("loss of smell and I can't taste food, 5 days now", "COVID-19"),
        ("headache with nausea and dizziness since yesterday", "Migraine"),
        ("diarrhea and nausea for 2 days", "Gastroenteritis"),
    ];
    for (text, label) in cases {
        let assessment = engine.assess(text, ManualInput::none()).unwrap();
        assert_eq!(assessment.prediction.label, label, "text: {}", text);
        assert!(assessment.prediction.alternatives.len() <= 3);
        assert!(assessment
            .prediction
            .alternatives
            .iter()
            .all(|alt| alt.label != label));
    }
}

#[tokio::test]
async fn test_open_bootstraps_and_persists() {
    let (config, _temp_dir) = create_test_config();
    let engine = create_test_engine(&config).await;
    let version = engine.model_version().unwrap();

    let reopened = create_test_engine(&config).await;
    assert_eq!(reopened.model_version().unwrap(), version);
}

#[tokio::test]
async fn test_diagnose_known_case_with_recommendations() {
    let (config, _temp_dir) = create_test_config();
    let engine = create_test_engine(&config).await;

    let report = engine
        .diagnose(
            "high fever, body aches and exhausted, started 2 days ago",
            ManualInput::none(),
        )
        .await
        .unwrap();

    match &report.outcome {
        TriageOutcome::Known(prediction) => {
            assert_eq!(prediction.label, "Flu");
            assert!(prediction.boosted_confidence >= 0.6);
            assert!(prediction.boosted_confidence <= 0.95);
            let bundle = report.recommendations.as_ref().unwrap();
            assert!(!bundle.medications.is_empty());
        }
        TriageOutcome::Unknown(_) => panic!("expected a known case"),
    }

    let stats = engine.statistics().await.unwrap();
    assert_eq!(stats.total_predictions, 1);
}

#[tokio::test]
async fn test_unknown_case_advisory_and_review_queue() {
    let (mut config, _temp_dir) = create_test_config();
    config.gate.unknown_threshold = 0.99;
    let engine = create_test_engine(&config).await;

    let report = engine
        .diagnose("chest pain and short of breath", ManualInput::none())
        .await
        .unwrap();
    assert!(report.is_unknown());
    assert!(report.recommendations.is_none());

    let advisory = report.outcome.advisory().unwrap();
    assert!(advisory.is_urgent());
    assert!(advisory.urgent_indicators.contains(&"Chest pain".to_string()));
    assert!(advisory.message.contains("healthcare professional"));

    let queued = engine
        .learning()
        .events()
        .review
        .find_by_session_id(report.session_id.as_str())
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(engine.statistics().await.unwrap().unknown_cases, 1);
}

#[tokio::test]
async fn test_manual_input_is_flagged_and_boosted() {
    let engine = create_memory_engine(&TriageConfig::default(), shipped_corpus());
    let manual = engine.manual_input(Some("1"), Some("severe"));
    let assessment = engine.assess("headache", manual).unwrap();

    assert!(assessment.observation.overrides.duration);
    assert!(assessment.observation.overrides.intensity);
    assert!(assessment
        .prediction
        .boost_factors
        .iter()
        .any(|f| f.starts_with("manual input")));
}

#[tokio::test]
async fn test_parallel_diagnoses_share_artifact() {
    let engine = Arc::new(create_memory_engine(&TriageConfig::default(), shipped_corpus()));
    let version = engine.model_version().unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let text = if i % 2 == 0 { "cough and runny nose" } else { "bad headache" };
                engine.diagnose(text, ManualInput::none()).await.unwrap()
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().model_version, version);
    }
    assert_eq!(engine.statistics().await.unwrap().total_predictions, 16);
}
