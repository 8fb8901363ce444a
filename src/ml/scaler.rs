//! Feature standardization to zero mean and unit variance.

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Per-column standardization `z = (x - mean) / scale`.
///
/// `scale` is the population standard deviation of the training column; a
/// constant column keeps a scale of `1.0` so it maps to zero instead of NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl StandardScaler {
    /// Fit column means and scales on training rows.
    pub fn fit(x: &[Vec<f32>]) -> Result<Self, ModelError> {
        let first = x.first().ok_or(ModelError::EmptyTrainingSet)?;
        let n_features = first.len();
        let mut sums = vec![0f64; n_features];
        for row in x {
            if row.len() != n_features {
                return Err(ModelError::FeatureCountMismatch {
                    expected: n_features,
                    found: row.len(),
                });
            }
            for (sum, &v) in sums.iter_mut().zip(row) {
                *sum += v as f64;
            }
        }
        let n = x.len() as f64;
        let means: Vec<f64> = sums.iter().map(|s| s / n).collect();

        let mut sq = vec![0f64; n_features];
        for row in x {
            for ((acc, &v), &m) in sq.iter_mut().zip(row).zip(&means) {
                let d = v as f64 - m;
                *acc += d * d;
            }
        }
        let scale = sq
            .iter()
            .map(|&s| {
                let std = (s / n).sqrt();
                if std > f64::EPSILON { std as f32 } else { 1.0 }
            })
            .collect();
        Ok(Self {
            mean: means.into_iter().map(|m| m as f32).collect(),
            scale,
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one row; the row must have `n_features` values.
    pub fn transform_row(&self, row: &[f32]) -> Result<Vec<f32>, ModelError> {
        if row.len() != self.n_features() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&v, (&m, &s))| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, x: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, ModelError> {
        x.iter().map(|row| self.transform_row(row)).collect()
    }
}
