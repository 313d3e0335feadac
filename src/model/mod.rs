//! Diagnosis classifier and its versioned artifact lifecycle.
//!
//! - [`classifier`]: Gaussian naive-Bayes model
//! - [`artifact`]: immutable classifier + label space + schema triple
//! - [`registry`]: atomically swappable handle read by the serving path
//! - [`store`]: on-disk persistence, backups, and rollback

pub mod artifact;
pub mod classifier;
pub mod registry;
pub mod store;

pub use artifact::{ArtifactMetadata, ClassifierOutput, LabelSpace, ModelArtifact};
pub use classifier::GaussianNaiveBayes;
pub use registry::ModelRegistry;
pub use store::{ArtifactStore, BackupEntry};
