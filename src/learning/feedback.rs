//! Feedback loop: event recording, retrain trigger, and artifact activation.
//!
//! Every diagnosis is appended to the learning log and every piece of
//! feedback to the feedback log. After each feedback append the trigger
//! counts feedback inside the rolling window that arrived after the last
//! retraining attempt began; at the threshold a retrain is spawned.
//!
//! At most one retrain is in flight (`running` flag, claimed with `swap`).
//! Training runs on a blocking thread under a time budget. On acceptance the
//! current artifact is backed up, the candidate persisted, and only then is
//! the registry swapped. Every failure is folded into a [`RetrainOutcome`] and
//! leaves the active artifact untouched.

use super::corpus::TrainingSample;
use super::log::EventStore;
use super::records::{
    FeedbackInput, FeedbackRecord, LearningRecord, ReviewStatus, TrainingHistoryEntry,
    UnknownCaseRecord,
};
use super::retrain::{Candidate, CandidateTrainer, RetrainReport, Retrainer};
use crate::config::LearningConfig;
use crate::error::{Result, TriageError};
use crate::model::{ArtifactStore, ModelArtifact, ModelRegistry};
use crate::types::{ParsedObservation, PredictionResult, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// How a retraining attempt ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RetrainOutcome {
    /// Candidate activated
    Accepted(RetrainReport),
    /// Candidate scored below the floor and was discarded
    Rejected { accuracy: f64, floor: f64 },
    /// Training or activation failed; the old artifact stays active
    Failed { reason: String },
    /// Another retrain was already in flight
    AlreadyRunning,
}

impl RetrainOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RetrainOutcome::Accepted(_))
    }
}

/// Returned from [`FeedbackLoop::record_feedback`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    pub feedback_id: String,
    pub retrain_triggered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStatistics {
    pub total_predictions: usize,
    pub feedback_received: usize,
    pub unknown_cases: usize,
    /// Accepted retraining runs
    pub retraining_sessions: usize,
    pub model_version: Option<String>,
    pub last_retrained_at: Option<DateTime<Utc>>,
    pub last_accuracy: Option<f64>,
    pub retraining_in_progress: bool,
}

/// Clears the in-flight flag even if the retrain task panics
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Everything a retrain run needs, cloneable into a spawned task
#[derive(Clone)]
struct RetrainJob {
    events: EventStore,
    registry: Arc<ModelRegistry>,
    store: Option<ArtifactStore>,
    trainer: Arc<dyn CandidateTrainer>,
    abort: Arc<AtomicBool>,
    budget: Duration,
}

impl RetrainJob {
    async fn run(self) -> RetrainOutcome {
        let started = std::time::Instant::now();
        match self.execute().await {
            Ok(report) => {
                info!(
                    "Retraining accepted model {} (accuracy {:.3}, {} samples) in {:?}",
                    report.version_id,
                    report.accuracy,
                    report.sample_count,
                    started.elapsed()
                );
                RetrainOutcome::Accepted(report)
            }
            Err(TriageError::RetrainRejected { accuracy, floor }) => {
                warn!(
                    "Retraining rejected: accuracy {:.3} below floor {:.3}, keeping active model",
                    accuracy, floor
                );
                RetrainOutcome::Rejected { accuracy, floor }
            }
            Err(e) => {
                warn!("Retraining failed, keeping active model: {}", e);
                RetrainOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn execute(&self) -> Result<RetrainReport> {
        let feedback = collect_feedback_samples(&self.events).await?;
        debug!("Retraining with {} feedback-labelled samples", feedback.len());

        let trainer = Arc::clone(&self.trainer);
        let abort = Arc::clone(&self.abort);
        let training =
            tokio::task::spawn_blocking(move || trainer.train_candidate(feedback, &abort));

        let candidate = match timeout(self.budget, training).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                return Err(TriageError::RetrainAborted(format!(
                    "training task failed: {}",
                    join_error
                )))
            }
            Err(_) => {
                self.abort.store(true, Ordering::SeqCst);
                return Err(TriageError::RetrainAborted(format!(
                    "exceeded time budget of {:?}",
                    self.budget
                )));
            }
        };

        self.activate(candidate).await
    }

    async fn activate(&self, candidate: Candidate) -> Result<RetrainReport> {
        if self.abort.load(Ordering::SeqCst) {
            return Err(TriageError::RetrainAborted(
                "abort requested before activation".into(),
            ));
        }

        let previous = self.registry.current().ok();
        let Candidate { artifact, report } = candidate;
        let artifact = Arc::new(artifact);

        if let Some(store) = &self.store {
            let store = store.clone();
            let candidate = Arc::clone(&artifact);
            let restore = previous.clone();
            tokio::task::spawn_blocking(move || install(&store, &candidate, restore.as_deref()))
                .await
                .map_err(|e| TriageError::RetrainIo(format!("install task failed: {}", e)))??;
        }

        self.registry.swap(artifact)?;

        let entry = TrainingHistoryEntry {
            timestamp: Utc::now(),
            accuracy: report.accuracy,
            sample_count: report.sample_count,
            version_id: report.version_id.clone(),
            feedback_samples: report.feedback_samples,
            previous_version: previous.map(|p| p.version_id().to_string()),
        };
        if let Err(e) = self.events.history.append(&entry).await {
            warn!("Model {} active but history append failed: {}", entry.version_id, e);
        }

        Ok(report)
    }
}

/// Back up the active artifact, then persist `candidate` in its place.
///
/// If the persist fails the previous artifact is rewritten and the backup
/// just taken is discarded, so the backup list only holds replaced versions.
fn install(
    store: &ArtifactStore,
    candidate: &ModelArtifact,
    previous: Option<&ModelArtifact>,
) -> Result<()> {
    let backup = store
        .backup_current()
        .map_err(|e| TriageError::RetrainIo(format!("backup failed: {}", e)))?;

    if let Err(e) = store.persist(candidate) {
        if let Some(previous) = previous {
            if let Err(restore) = store.persist(previous) {
                error!("Failed to restore previous artifact on disk: {}", restore);
            }
        }
        if let Some(backup) = backup {
            if let Err(cleanup) = store.discard_backup(&backup) {
                warn!("Failed to remove backup {}: {}", backup.display(), cleanup);
            }
        }
        return Err(TriageError::RetrainIo(format!("persist failed: {}", e)));
    }
    Ok(())
}

/// Join learning records with their latest labelled feedback
pub async fn collect_feedback_samples(events: &EventStore) -> Result<Vec<TrainingSample>> {
    let mut labels: HashMap<String, String> = HashMap::new();
    for feedback in events.feedback.read_all().await? {
        if let Some(label) = feedback.actual_label {
            labels.insert(feedback.session_id.0, label);
        }
    }

    let mut samples = Vec::new();
    for record in events.learning.read_all().await? {
        if let Some(label) = labels.remove(record.session_id.as_str()) {
            samples.push(TrainingSample::from_observation(&record.observation, label));
        }
    }

    if !labels.is_empty() {
        debug!(
            "{} labelled feedback record(s) have no matching prediction",
            labels.len()
        );
    }
    Ok(samples)
}

/// Records events and drives retraining
pub struct FeedbackLoop {
    job: RetrainJob,
    config: LearningConfig,
    running: Arc<AtomicBool>,
    last_attempt: Mutex<Option<DateTime<Utc>>>,
    handle: Mutex<Option<JoinHandle<RetrainOutcome>>>,
}

impl FeedbackLoop {
    /// `store` may be `None` for purely in-memory operation
    pub fn new(
        events: EventStore,
        registry: Arc<ModelRegistry>,
        store: Option<ArtifactStore>,
        retrainer: Retrainer,
    ) -> Self {
        let config = retrainer.config().clone();
        Self::with_trainer(events, registry, store, config, Arc::new(retrainer))
    }

    /// Build around any [`CandidateTrainer`]
    pub fn with_trainer(
        events: EventStore,
        registry: Arc<ModelRegistry>,
        store: Option<ArtifactStore>,
        config: LearningConfig,
        trainer: Arc<dyn CandidateTrainer>,
    ) -> Self {
        Self {
            job: RetrainJob {
                events,
                registry,
                store,
                trainer,
                abort: Arc::new(AtomicBool::new(false)),
                budget: config.max_retrain_duration(),
            },
            config,
            running: Arc::new(AtomicBool::new(false)),
            last_attempt: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Override the wall-clock budget for one retraining run
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.job.budget = budget;
        self
    }

    pub fn events(&self) -> &EventStore {
        &self.job.events
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Seed the trigger cutoff from the newest training history entry
    pub async fn restore_state(&self) -> Result<()> {
        let latest = self
            .job
            .events
            .history
            .read_all()
            .await?
            .into_iter()
            .map(|entry| entry.timestamp)
            .max();
        if let Some(timestamp) = latest {
            debug!("Last retrain at {}", timestamp);
            *self.last_attempt.lock().await = Some(timestamp);
        }
        Ok(())
    }

    /// Append a learning record for one diagnosis
    pub async fn record_prediction(
        &self,
        observation: &ParsedObservation,
        prediction: &PredictionResult,
    ) -> Result<SessionId> {
        let record = LearningRecord {
            session_id: SessionId::new(),
            timestamp: Utc::now(),
            observation: observation.clone(),
            prediction: prediction.clone(),
        };
        self.job.events.learning.append(&record).await?;
        debug!("Recorded prediction for session {}", record.session_id);
        Ok(record.session_id)
    }

    /// Queue a low-confidence case for human review
    pub async fn record_unknown_case(
        &self,
        session_id: &SessionId,
        observation: &ParsedObservation,
        prediction: &PredictionResult,
        threshold: f64,
    ) -> Result<()> {
        let record = UnknownCaseRecord {
            session_id: session_id.clone(),
            timestamp: Utc::now(),
            observation: observation.clone(),
            withheld_label: prediction.label.clone(),
            confidence: prediction.boosted_confidence,
            threshold,
            model_version: prediction.model_version.clone(),
            status: ReviewStatus::Pending,
        };
        self.job.events.review.append(&record).await?;
        info!("Queued session {} for review", session_id);
        Ok(())
    }

    /// Append feedback for a known session, then evaluate the retrain trigger
    pub async fn record_feedback(&self, input: FeedbackInput) -> Result<FeedbackReceipt> {
        let record = FeedbackRecord::from_input(input);
        if record.session_id.as_str().is_empty() {
            return Err(TriageError::InvalidInput("session id is required".into()));
        }
        if self
            .job
            .events
            .learning
            .find_by_session_id(record.session_id.as_str())
            .await?
            .is_empty()
        {
            return Err(TriageError::NotFound(format!(
                "no prediction recorded for session {}",
                record.session_id
            )));
        }

        self.job.events.feedback.append(&record).await?;
        info!(
            "Recorded {} feedback for session {} (label: {})",
            record.kind,
            record.session_id,
            record.actual_label.as_deref().unwrap_or("none")
        );

        let retrain_triggered = if self.should_retrain().await? {
            self.trigger_retrain().await
        } else {
            false
        };

        Ok(FeedbackReceipt {
            feedback_id: record.id,
            retrain_triggered,
        })
    }

    /// Feedback inside the window that arrived after the last attempt began
    pub async fn pending_feedback(&self) -> Result<usize> {
        let window_start = Utc::now() - self.config.trigger_window();
        let last_attempt = *self.last_attempt.lock().await;
        Ok(self
            .job
            .events
            .feedback
            .read_all()
            .await?
            .iter()
            .filter(|f| f.timestamp >= window_start)
            .filter(|f| last_attempt.map_or(true, |t| f.timestamp > t))
            .count())
    }

    pub async fn should_retrain(&self) -> Result<bool> {
        let pending = self.pending_feedback().await?;
        debug!(
            "{} pending feedback record(s), trigger at {}",
            pending, self.config.trigger_threshold
        );
        Ok(pending >= self.config.trigger_threshold)
    }

    /// Spawn a background retrain unless one is already in flight
    pub async fn trigger_retrain(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Retraining already in progress, not starting another");
            return false;
        }
        let guard = RunningGuard(Arc::clone(&self.running));

        *self.last_attempt.lock().await = Some(Utc::now());
        self.job.abort.store(false, Ordering::SeqCst);

        info!("Starting background retraining");
        let job = self.job.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            job.run().await
        });
        *self.handle.lock().await = Some(handle);
        true
    }

    /// Retrain in the current task, honoring the single-flight guard
    pub async fn retrain_now(&self) -> RetrainOutcome {
        if self.running.swap(true, Ordering::SeqCst) {
            return RetrainOutcome::AlreadyRunning;
        }
        let _guard = RunningGuard(Arc::clone(&self.running));

        *self.last_attempt.lock().await = Some(Utc::now());
        self.job.abort.store(false, Ordering::SeqCst);
        self.job.clone().run().await
    }

    /// Wait for the most recently spawned retrain, if any
    pub async fn await_retrain(&self) -> Option<RetrainOutcome> {
        let handle = self.handle.lock().await.take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => Some(RetrainOutcome::Failed {
                reason: format!("retrain task failed: {}", e),
            }),
        }
    }

    /// Ask an in-flight retrain to stop before it activates anything
    pub fn abort_retrain(&self) {
        if self.is_retraining() {
            info!("Abort requested for in-flight retraining");
        }
        self.job.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_retraining(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn history(&self) -> Result<Vec<TrainingHistoryEntry>> {
        self.job.events.history.read_all().await
    }

    pub async fn statistics(&self) -> Result<LearningStatistics> {
        let events = &self.job.events;
        let history = events.history.read_all().await?;
        let last = history.last();

        Ok(LearningStatistics {
            total_predictions: events.learning.count().await?,
            feedback_received: events.feedback.count().await?,
            unknown_cases: events.review.count().await?,
            retraining_sessions: history.len(),
            model_version: self.job.registry.version(),
            last_retrained_at: last.map(|e| e.timestamp),
            last_accuracy: last.map(|e| e.accuracy),
            retraining_in_progress: self.is_retraining(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSchema;
    use crate::learning::corpus::Corpus;
    use crate::types::{Intensity, ManualOverrides, SymptomKey};
    use std::collections::BTreeSet;

    fn observation(symptoms: &[SymptomKey], days: u32, intensity: Intensity) -> ParsedObservation {
        ParsedObservation {
            symptoms: symptoms.iter().copied().collect::<BTreeSet<_>>(),
            duration_days: days,
            intensity,
            raw_text: String::new(),
            overrides: ManualOverrides::default(),
        }
    }

    fn base_corpus() -> Corpus {
        let flu = observation(&[SymptomKey::Fever, SymptomKey::Cough], 4, Intensity::Severe);
        let cold = observation(&[SymptomKey::RunnyNose, SymptomKey::SoreThroat], 20, Intensity::Mild);
        let mut samples = Vec::new();
        for _ in 0..5 {
            samples.push(TrainingSample::from_observation(&flu, "Influenza"));
            samples.push(TrainingSample::from_observation(&cold, "Common Cold"));
        }
        Corpus::new(samples)
    }

    fn prediction(version: &str) -> PredictionResult {
        PredictionResult {
            label: "Influenza".to_string(),
            raw_probability: 0.7,
            boosted_confidence: 0.7,
            alternatives: Vec::new(),
            boost_factors: Vec::new(),
            model_version: version.to_string(),
        }
    }

    fn create_test_loop(threshold: usize, floor: f64) -> (FeedbackLoop, Arc<ModelRegistry>) {
        let config = LearningConfig {
            trigger_threshold: threshold,
            accuracy_floor: floor,
            ..LearningConfig::default()
        };
        let retrainer = Retrainer::new(base_corpus(), FeatureSchema::standard(), config);
        let initial = retrainer.bootstrap().unwrap().artifact;
        let registry = Arc::new(ModelRegistry::with_artifact(initial));
        let feedback_loop = FeedbackLoop::new(
            EventStore::in_memory(),
            Arc::clone(&registry),
            None,
            retrainer,
        );
        (feedback_loop, registry)
    }

    #[tokio::test]
    async fn test_feedback_requires_known_session() {
        let (feedback_loop, _) = create_test_loop(10, 0.4);
        let err = feedback_loop
            .record_feedback(FeedbackInput::labelled("nope", "Influenza"))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::NotFound(_)));

        let err = feedback_loop
            .record_feedback(FeedbackInput::labelled("  ", "Influenza"))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_trigger_fires_at_threshold() {
        let (feedback_loop, registry) = create_test_loop(3, 0.4);
        let original = registry.version().unwrap();
        let obs = observation(&[SymptomKey::Fever, SymptomKey::Cough], 3, Intensity::Severe);

        let mut triggered = Vec::new();
        for _ in 0..3 {
            let session = feedback_loop
                .record_prediction(&obs, &prediction(&original))
                .await
                .unwrap();
            let receipt = feedback_loop
                .record_feedback(FeedbackInput::labelled(session.as_str(), "Influenza"))
                .await
                .unwrap();
            triggered.push(receipt.retrain_triggered);
        }
        assert_eq!(triggered, vec![false, false, true]);

        let outcome = feedback_loop.await_retrain().await.unwrap();
        assert!(outcome.is_accepted());
        assert_ne!(registry.version().unwrap(), original);

        let stats = feedback_loop.statistics().await.unwrap();
        assert_eq!(stats.total_predictions, 3);
        assert_eq!(stats.feedback_received, 3);
        assert_eq!(stats.retraining_sessions, 1);
        assert!(!stats.retraining_in_progress);
        assert_eq!(feedback_loop.pending_feedback().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejected_retrain_keeps_artifact() {
        let (feedback_loop, registry) = create_test_loop(1, 1.01);
        let original = registry.version().unwrap();

        let session = feedback_loop
            .record_prediction(&observation(&[], 7, Intensity::Moderate), &prediction(&original))
            .await
            .unwrap();
        let receipt = feedback_loop
            .record_feedback(FeedbackInput::labelled(session.as_str(), "Influenza"))
            .await
            .unwrap();
        assert!(receipt.retrain_triggered);

        let outcome = feedback_loop.await_retrain().await.unwrap();
        assert!(matches!(outcome, RetrainOutcome::Rejected { .. }));
        assert_eq!(registry.version().unwrap(), original);
        assert!(feedback_loop.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feedback_outside_window_is_not_pending() {
        let (feedback_loop, _) = create_test_loop(2, 0.4);
        let obs = observation(&[SymptomKey::Fever, SymptomKey::Cough], 3, Intensity::Severe);
        let session = feedback_loop
            .record_prediction(&obs, &prediction("v1"))
            .await
            .unwrap();

        let cutoff = Utc::now() - feedback_loop.config().trigger_window();
        for _ in 0..3 {
            let mut stale =
                FeedbackRecord::from_input(FeedbackInput::labelled(session.as_str(), "Influenza"));
            stale.timestamp = cutoff - chrono::Duration::days(1);
            feedback_loop.events().feedback.append(&stale).await.unwrap();
        }
        assert_eq!(feedback_loop.pending_feedback().await.unwrap(), 0);
        assert!(!feedback_loop.should_retrain().await.unwrap());

        let receipt = feedback_loop
            .record_feedback(FeedbackInput::labelled(session.as_str(), "Influenza"))
            .await
            .unwrap();
        assert!(!receipt.retrain_triggered);
        assert_eq!(feedback_loop.pending_feedback().await.unwrap(), 1);
    }

    /// Blocks until aborted, like a fit that overruns its budget
    struct StalledTrainer {
        candidate: Candidate,
    }

    impl CandidateTrainer for StalledTrainer {
        fn train_candidate(
            &self,
            _feedback: Vec<TrainingSample>,
            abort: &AtomicBool,
        ) -> Result<Candidate> {
            let started = std::time::Instant::now();
            while !abort.load(Ordering::SeqCst) && started.elapsed() < Duration::from_secs(5) {
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok(self.candidate.clone())
        }
    }

    #[tokio::test]
    async fn test_retrain_over_budget_is_aborted() {
        let config = LearningConfig::default();
        let retrainer = Retrainer::new(base_corpus(), FeatureSchema::standard(), config.clone());
        let initial = retrainer.bootstrap().unwrap().artifact;
        let original = initial.version_id().to_string();
        let registry = Arc::new(ModelRegistry::with_artifact(initial));
        let stalled = StalledTrainer {
            candidate: retrainer.bootstrap().unwrap(),
        };

        let feedback_loop = FeedbackLoop::with_trainer(
            EventStore::in_memory(),
            Arc::clone(&registry),
            None,
            config,
            Arc::new(stalled),
        )
        .with_time_budget(Duration::from_millis(50));

        match feedback_loop.retrain_now().await {
            RetrainOutcome::Failed { reason } => assert!(reason.contains("time budget"), "{}", reason),
            other => panic!("expected budget failure, got {:?}", other),
        }
        assert!(feedback_loop.job.abort.load(Ordering::SeqCst));
        assert_eq!(registry.version().unwrap(), original);
        assert!(feedback_loop.history().await.unwrap().is_empty());
        assert!(!feedback_loop.is_retraining());
    }

    #[tokio::test]
    async fn test_single_flight() {
        let (feedback_loop, _) = create_test_loop(10, 0.4);
        feedback_loop.running.store(true, Ordering::SeqCst);
        assert!(!feedback_loop.trigger_retrain().await);
        assert_eq!(feedback_loop.retrain_now().await, RetrainOutcome::AlreadyRunning);

        feedback_loop.running.store(false, Ordering::SeqCst);
        assert!(feedback_loop.retrain_now().await.is_accepted());
        assert!(!feedback_loop.is_retraining());
    }

    #[tokio::test]
    async fn test_latest_labelled_feedback_wins() {
        let (feedback_loop, _) = create_test_loop(100, 0.4);
        let obs = observation(&[SymptomKey::Headache], 2, Intensity::Severe);
        let session = feedback_loop
            .record_prediction(&obs, &prediction("v1"))
            .await
            .unwrap();

        for label in ["Influenza", "Migraine"] {
            feedback_loop
                .record_feedback(FeedbackInput::labelled(session.as_str(), label))
                .await
                .unwrap();
        }
        feedback_loop
            .record_feedback(FeedbackInput {
                session_id: session.to_string(),
                outcome: Some("resolved".to_string()),
                ..FeedbackInput::default()
            })
            .await
            .unwrap();

        let samples = collect_feedback_samples(feedback_loop.events()).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].label, "Migraine");
        assert_eq!(samples[0].duration_days, 2);
    }

    #[tokio::test]
    async fn test_unknown_case_queue() {
        let (feedback_loop, _) = create_test_loop(10, 0.4);
        let obs = observation(&[], 7, Intensity::Moderate);
        let pred = prediction("v1");
        let session = feedback_loop.record_prediction(&obs, &pred).await.unwrap();
        feedback_loop
            .record_unknown_case(&session, &obs, &pred, 0.6)
            .await
            .unwrap();

        let queued = feedback_loop
            .events()
            .review
            .find_by_session_id(session.as_str())
            .await
            .unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].status, ReviewStatus::Pending);
        assert_eq!(queued[0].withheld_label, "Influenza");
        assert_eq!(feedback_loop.statistics().await.unwrap().unknown_cases, 1);
    }
}
