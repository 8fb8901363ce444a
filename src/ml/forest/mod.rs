//! Seeded random forest classifier.
//!
//! - Bootstrap resampling per tree.
//! - `sqrt(n_features)` candidate features per split by default.
//! - Probabilities are the mean of the per-tree leaf class distributions and
//!   the predicted class is their argmax.

mod tree;

pub use tree::{DecisionTree, TreeNode};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use self::tree::TreeParams;
use super::{ModelError, argmax};

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestOptions {
    pub n_trees: usize,
    pub seed: u64,
    /// Unlimited when `None`.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features per split; `sqrt(n_features)` when `None`.
    pub max_features: Option<usize>,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    pub n_features: usize,
    pub n_classes: usize,
    pub options: ForestOptions,
    pub trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    /// Fit a forest on `x` with class ids `y` in `0..n_classes`.
    pub fn fit(
        x: &[Vec<f32>],
        y: &[usize],
        n_classes: usize,
        options: &ForestOptions,
    ) -> Result<Self, ModelError> {
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ModelError::LabelCountMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
            return Err(ModelError::LabelOutOfRange { label, n_classes });
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().find(|row| row.len() != n_features) {
            return Err(ModelError::FeatureCountMismatch {
                expected: n_features,
                found: row.len(),
            });
        }
        if x.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteInput);
        }

        let max_features = options
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features.max(1));
        let params = TreeParams {
            n_classes,
            max_depth: options.max_depth,
            min_samples_split: options.min_samples_split,
            max_features,
        };

        let n = x.len();
        let mut seeds = StdRng::seed_from_u64(options.seed);
        let mut trees = Vec::with_capacity(options.n_trees);
        for _ in 0..options.n_trees {
            let mut rng = StdRng::seed_from_u64(seeds.random::<u64>());
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            trees.push(DecisionTree::grow(x, y, bootstrap, &params, &mut rng));
        }
        tracing::debug!(
            trees = trees.len(),
            max_depth = trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
            "Fitted random forest"
        );

        Ok(Self {
            n_features,
            n_classes,
            options: options.clone(),
            trees,
        })
    }

    /// Mean leaf distribution across trees for one row.
    pub fn predict_proba_row(&self, row: &[f32]) -> Result<Vec<f32>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        if row.len() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }
        let mut sums = vec![0f64; self.n_classes];
        for tree in &self.trees {
            for (sum, &p) in sums.iter_mut().zip(tree.leaf_distribution(row)) {
                *sum += p as f64;
            }
        }
        let n_trees = self.trees.len() as f64;
        Ok(sums.into_iter().map(|s| (s / n_trees) as f32).collect())
    }

    pub fn predict_row(&self, row: &[f32]) -> Result<usize, ModelError> {
        Ok(argmax(&self.predict_proba_row(row)?))
    }
}
