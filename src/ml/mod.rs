//! Machine learning building blocks for training and inference.
//!
//! Everything here is deterministic given a seed and serializes to JSON, so a
//! fitted pipeline can be written by the trainer and loaded by the server.

use thiserror::Error;

pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod scaler;

pub use forest::{ForestOptions, RandomForestClassifier};
pub use pipeline::Pipeline;
pub use scaler::StandardScaler;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("mismatched training inputs ({rows} rows) and labels ({labels} labels)")]
    LabelCountMismatch { rows: usize, labels: usize },
    #[error("label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },
    #[error("model is not fitted")]
    NotFitted,
    #[error("expected {expected} features, found {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
    #[error("Input contains NaN, infinity or a value too large for f32")]
    NonFiniteInput,
}

/// A fitted classifier over fixed-length feature rows.
pub trait Classifier {
    /// Number of features each row must have.
    fn n_features(&self) -> usize;

    fn n_classes(&self) -> usize;

    /// Predict a class id for each row, in row order.
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, ModelError>;

    /// Whether [`Classifier::predict_proba`] yields class probabilities.
    fn supports_proba(&self) -> bool {
        false
    }

    /// Class probability vectors for each row, or `None` when unsupported.
    fn predict_proba(&self, _rows: &[Vec<f64>]) -> Option<Result<Vec<Vec<f32>>, ModelError>> {
        None
    }
}

/// Convert request rows to the model's `f32` feature space.
///
/// Rejects rows of the wrong width and values that are non-finite or overflow
/// `f32`.
pub(crate) fn rows_to_f32(
    rows: &[Vec<f64>],
    n_features: usize,
) -> Result<Vec<Vec<f32>>, ModelError> {
    rows.iter()
        .map(|row| {
            if row.len() != n_features {
                return Err(ModelError::FeatureCountMismatch {
                    expected: n_features,
                    found: row.len(),
                });
            }
            row.iter()
                .map(|&value| {
                    let narrowed = value as f32;
                    if narrowed.is_finite() {
                        Ok(narrowed)
                    } else {
                        Err(ModelError::NonFiniteInput)
                    }
                })
                .collect()
        })
        .collect()
}

/// Index of the largest value; ties resolve to the lowest index.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}
