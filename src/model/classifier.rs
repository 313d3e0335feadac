//! Gaussian naive-Bayes classifier.
//!
//! Small, dependency-free probabilistic model: per-class feature means and
//! variances plus class priors. Predictions are normalized posteriors computed
//! in log space.

use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};

/// Fraction of the largest feature variance added to every variance
pub const DEFAULT_VAR_SMOOTHING: f64 = 0.01;

const MIN_VARIANCE: f64 = 1e-9;

/// Trained Gaussian naive-Bayes parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    log_priors: Vec<f64>,
    means: Vec<Vec<f64>>,
    variances: Vec<Vec<f64>>,
}

impl GaussianNaiveBayes {
    /// Fit on row-major samples with class indices in `0..n_classes`
    pub fn fit(samples: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<Self> {
        Self::fit_with_smoothing(samples, labels, n_classes, DEFAULT_VAR_SMOOTHING)
    }

    pub fn fit_with_smoothing(
        samples: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        var_smoothing: f64,
    ) -> Result<Self> {
        if samples.is_empty() || n_classes == 0 {
            return Err(TriageError::InsufficientTrainingData(
                "no samples to fit".to_string(),
            ));
        }
        if samples.len() != labels.len() {
            return Err(TriageError::InvalidInput(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }
        let n_features = samples[0].len();
        if samples.iter().any(|row| row.len() != n_features) {
            return Err(TriageError::SchemaMismatch {
                expected: n_features,
                actual: samples
                    .iter()
                    .map(Vec::len)
                    .find(|len| *len != n_features)
                    .unwrap_or(n_features),
            });
        }
        if let Some(bad) = labels.iter().find(|label| **label >= n_classes) {
            return Err(TriageError::InvalidInput(format!(
                "class index {} outside label space of {}",
                bad, n_classes
            )));
        }

        let mut counts = vec![0usize; n_classes];
        let mut sums = vec![vec![0.0; n_features]; n_classes];
        for (row, &label) in samples.iter().zip(labels) {
            counts[label] += 1;
            for (acc, value) in sums[label].iter_mut().zip(row) {
                *acc += value;
            }
        }
        if let Some(empty) = counts.iter().position(|count| *count == 0) {
            return Err(TriageError::InsufficientTrainingData(format!(
                "class index {} has no samples",
                empty
            )));
        }

        let means: Vec<Vec<f64>> = sums
            .iter()
            .zip(&counts)
            .map(|(sum, &count)| sum.iter().map(|s| s / count as f64).collect())
            .collect();

        let mut squared = vec![vec![0.0; n_features]; n_classes];
        for (row, &label) in samples.iter().zip(labels) {
            for ((acc, value), mean) in squared[label].iter_mut().zip(row).zip(&means[label]) {
                *acc += (value - mean).powi(2);
            }
        }

        let epsilon = (var_smoothing * max_feature_variance(samples)).max(MIN_VARIANCE);
        let variances = squared
            .iter()
            .zip(&counts)
            .map(|(sq, &count)| sq.iter().map(|s| s / count as f64 + epsilon).collect())
            .collect();

        let total = samples.len() as f64;
        let log_priors = counts
            .iter()
            .map(|&count| (count as f64 / total).ln())
            .collect();

        Ok(Self {
            log_priors,
            means,
            variances,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.log_priors.len()
    }

    pub fn n_features(&self) -> usize {
        self.means.first().map(Vec::len).unwrap_or(0)
    }

    /// Posterior probability per class, summing to 1
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let joint: Vec<f64> = self
            .log_priors
            .iter()
            .zip(self.means.iter().zip(&self.variances))
            .map(|(log_prior, (means, variances))| {
                log_prior
                    + x.iter()
                        .zip(means.iter().zip(variances))
                        .map(|(value, (mean, var))| {
                            -0.5 * (2.0 * std::f64::consts::PI * var).ln()
                                - (value - mean).powi(2) / (2.0 * var)
                        })
                        .sum::<f64>()
            })
            .collect();

        let max = joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = joint.iter().map(|j| (j - max).exp()).collect();
        let norm: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / norm).collect()
    }

    /// Index of the most probable class
    pub fn predict(&self, x: &[f64]) -> usize {
        self.predict_proba(x)
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
            .unwrap_or(0)
    }

    /// Share of samples whose predicted class matches the label
    pub fn accuracy(&self, samples: &[Vec<f64>], labels: &[usize]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let correct = samples
            .iter()
            .zip(labels)
            .filter(|(row, &label)| self.predict(row) == label)
            .count();
        correct as f64 / samples.len() as f64
    }
}

fn max_feature_variance(samples: &[Vec<f64>]) -> f64 {
    let n = samples.len() as f64;
    let n_features = samples.first().map(Vec::len).unwrap_or(0);
    (0..n_features)
        .map(|j| {
            let mean = samples.iter().map(|row| row[j]).sum::<f64>() / n;
            samples.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> (Vec<Vec<f64>>, Vec<usize>) {
        let samples = vec![
            vec![1.0, 0.0, 3.0],
            vec![1.0, 0.0, 4.0],
            vec![1.0, 1.0, 2.0],
            vec![0.0, 1.0, 20.0],
            vec![0.0, 1.0, 25.0],
            vec![0.0, 0.0, 30.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        (samples, labels)
    }

    #[test]
    fn test_fit_and_predict() {
        let (samples, labels) = toy();
        let model = GaussianNaiveBayes::fit(&samples, &labels, 2).unwrap();
        assert_eq!(model.n_classes(), 2);
        assert_eq!(model.n_features(), 3);
        assert_eq!(model.predict(&[1.0, 0.0, 3.0]), 0);
        assert_eq!(model.predict(&[0.0, 1.0, 28.0]), 1);
        assert_eq!(model.accuracy(&samples, &labels), 1.0);
    }

    #[test]
    fn test_probabilities_are_normalized() {
        let (samples, labels) = toy();
        let model = GaussianNaiveBayes::fit(&samples, &labels, 2).unwrap();
        let proba = model.predict_proba(&[0.5, 0.5, 10.0]);
        assert_eq!(proba.len(), 2);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_rejects_inconsistent_input() {
        let (samples, _) = toy();
        assert!(matches!(
            GaussianNaiveBayes::fit(&samples, &[0, 1], 2),
            Err(TriageError::InvalidInput(_))
        ));
        assert!(matches!(
            GaussianNaiveBayes::fit(&samples, &[0, 0, 0, 0, 0, 0], 2),
            Err(TriageError::InsufficientTrainingData(_))
        ));
        assert!(matches!(
            GaussianNaiveBayes::fit(&[], &[], 2),
            Err(TriageError::InsufficientTrainingData(_))
        ));
        let ragged = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            GaussianNaiveBayes::fit(&ragged, &[0, 1], 2),
            Err(TriageError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_constant_features_do_not_divide_by_zero() {
        let samples = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let model = GaussianNaiveBayes::fit(&samples, &[0, 1], 2).unwrap();
        let proba = model.predict_proba(&[1.0, 1.0]);
        assert!(proba.iter().all(|p| p.is_finite()));
        assert!((proba[0] - 0.5).abs() < 1e-9);
    }
}
