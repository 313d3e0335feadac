//! Configuration for the triage engine
//!
//! Layered loading: built-in defaults, then an optional TOML file, then
//! `TRIAGE__<SECTION>__<KEY>` environment variables
//! (e.g. `TRIAGE__GATE__UNKNOWN_THRESHOLD=0.5`).

use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Confidence below which a result is routed to the unknown-case advisory.
pub const DEFAULT_UNKNOWN_THRESHOLD: f64 = 0.6;

/// Duration assumed when the text names none.
pub const DEFAULT_DURATION_DAYS: u32 = 7;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub parser: ParserConfig,
    pub booster: BoosterConfig,
    pub gate: GateConfig,
    pub learning: LearningConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub default_duration_days: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_duration_days: DEFAULT_DURATION_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterConfig {
    /// Number of ranked alternatives returned next to the primary label
    pub alternatives: usize,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self { alternatives: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub unknown_threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            unknown_threshold: DEFAULT_UNKNOWN_THRESHOLD,
        }
    }
}

/// Feedback trigger and retraining settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Feedback records inside the window needed to start a retrain
    pub trigger_threshold: usize,
    pub trigger_window_days: i64,
    /// Minimum validation accuracy a candidate must reach
    pub accuracy_floor: f64,
    pub validation_fraction: f64,
    pub min_samples_per_class: usize,
    /// Wall-clock budget for one retraining run
    pub max_retrain_secs: u64,
    /// Seed for the train/validation shuffle
    pub seed: u64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            trigger_threshold: 10,
            trigger_window_days: 30,
            accuracy_floor: 0.4,
            validation_fraction: 0.2,
            min_samples_per_class: 2,
            max_retrain_secs: 300,
            seed: 42,
        }
    }
}

impl LearningConfig {
    pub fn max_retrain_duration(&self) -> Duration {
        Duration::from_secs(self.max_retrain_secs)
    }

    pub fn trigger_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.trigger_window_days)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the append-only event logs
    pub data_dir: PathBuf,
    /// Directory holding the active artifact and its backups
    pub artifact_dir: PathBuf,
    /// Base training corpus (JSON array of samples)
    pub base_corpus: PathBuf,
    /// Recommendation table (JSON object keyed by label); missing file means empty
    pub recommendations: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = default_data_root();
        Self {
            data_dir: root.join("events"),
            artifact_dir: root.join("model"),
            base_corpus: PathBuf::from("data").join("base_corpus.json"),
            recommendations: PathBuf::from("data").join("recommendations.json"),
        }
    }
}

/// Default data root using the XDG data directory
fn default_data_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medichain-triage")
}

impl TriageConfig {
    /// Load configuration from defaults, an optional file, and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("TRIAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: TriageConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Point all storage paths under a single root directory
    pub fn with_root(mut self, root: &Path) -> Self {
        self.storage.data_dir = root.join("events");
        self.storage.artifact_dir = root.join("model");
        self
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| -> Result<()> {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must be within [0, 1], got {}", name, value)));
            }
            Ok(())
        };

        unit("gate.unknown_threshold", self.gate.unknown_threshold)?;
        unit("learning.accuracy_floor", self.learning.accuracy_floor)?;
        unit("learning.validation_fraction", self.learning.validation_fraction)?;

        if self.learning.validation_fraction == 0.0 || self.learning.validation_fraction == 1.0 {
            return Err(invalid(
                "learning.validation_fraction must leave samples on both sides of the split"
                    .to_string(),
            ));
        }
        if self.learning.trigger_threshold == 0 {
            return Err(invalid("learning.trigger_threshold must be positive".to_string()));
        }
        if self.learning.trigger_window_days <= 0 {
            return Err(invalid("learning.trigger_window_days must be positive".to_string()));
        }
        if self.learning.min_samples_per_class < 2 {
            return Err(invalid(
                "learning.min_samples_per_class must be at least 2".to_string(),
            ));
        }
        if self.learning.max_retrain_secs == 0 {
            return Err(invalid("learning.max_retrain_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TriageError::Other(e.to_string()))
    }
}

fn invalid(message: String) -> TriageError {
    TriageError::Config(config::ConfigError::Message(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TriageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gate.unknown_threshold, DEFAULT_UNKNOWN_THRESHOLD);
        assert_eq!(config.parser.default_duration_days, 7);
        assert_eq!(config.learning.trigger_threshold, 10);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut config = TriageConfig::default();
        config.gate.unknown_threshold = 1.5;
        assert!(matches!(config.validate(), Err(TriageError::Config(_))));

        let mut config = TriageConfig::default();
        config.learning.min_samples_per_class = 1;
        assert!(config.validate().is_err());

        let mut config = TriageConfig::default();
        config.learning.validation_fraction = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("triage.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[gate]\nunknown_threshold = 0.5\n\n[learning]\ntrigger_threshold = 3")
            .unwrap();

        let config = TriageConfig::load(Some(&path)).unwrap();
        assert_eq!(config.gate.unknown_threshold, 0.5);
        assert_eq!(config.learning.trigger_threshold, 3);
        // Untouched sections keep defaults
        assert_eq!(config.parser.default_duration_days, 7);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        std::env::set_var("TRIAGE__PARSER__DEFAULT_DURATION_DAYS", "5");
        let config = TriageConfig::load(None).unwrap();
        std::env::remove_var("TRIAGE__PARSER__DEFAULT_DURATION_DAYS");

        assert_eq!(config.parser.default_duration_days, 5);
    }

    #[test]
    fn test_to_toml_contains_sections() {
        let rendered = TriageConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[gate]"));
        assert!(rendered.contains("unknown_threshold"));
    }
}
