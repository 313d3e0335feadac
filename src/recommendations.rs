//! Recommendation lookup keyed by diagnosis label.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub duration: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Guidance attached to a known diagnosis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub treatments: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Keyed lookup of recommendation content
pub trait RecommendationLookup: Send + Sync {
    fn get(&self, label: &str) -> Option<RecommendationBundle>;
}

/// Fixed table, usually loaded from a JSON object keyed by label
#[derive(Debug, Clone, Default)]
pub struct StaticRecommendations {
    table: HashMap<String, RecommendationBundle>,
}

impl StaticRecommendations {
    pub fn new(table: HashMap<String, RecommendationBundle>) -> Self {
        Self { table }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a JSON table; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(
                "No recommendation table at {}, continuing without one",
                path.display()
            );
            return Ok(Self::empty());
        }
        let bytes = std::fs::read(path)?;
        let table: HashMap<String, RecommendationBundle> = serde_json::from_slice(&bytes)?;
        info!(
            "Loaded recommendations for {} label(s) from {}",
            table.len(),
            path.display()
        );
        Ok(Self { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl RecommendationLookup for StaticRecommendations {
    fn get(&self, label: &str) -> Option<RecommendationBundle> {
        self.table.get(label).cloned()
    }
}
