//! Standardization followed by a random forest, fitted as one unit.

use serde::{Deserialize, Serialize};

use super::forest::{ForestOptions, RandomForestClassifier};
use super::scaler::StandardScaler;
use super::{Classifier, ModelError, rows_to_f32};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub scaler: StandardScaler,
    pub classifier: RandomForestClassifier,
}

impl Pipeline {
    /// Fit the scaler on `x`, then the forest on the scaled rows.
    pub fn fit(
        x: &[Vec<f32>],
        y: &[usize],
        n_classes: usize,
        options: &ForestOptions,
    ) -> Result<Self, ModelError> {
        let scaler = StandardScaler::fit(x)?;
        let scaled = scaler.transform(x)?;
        let classifier = RandomForestClassifier::fit(&scaled, y, n_classes, options)?;
        Ok(Self { scaler, classifier })
    }

    /// Class probabilities for already-narrowed rows.
    pub fn predict_proba_f32(&self, x: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, ModelError> {
        x.iter()
            .map(|row| {
                let scaled = self.scaler.transform_row(row)?;
                self.classifier.predict_proba_row(&scaled)
            })
            .collect()
    }

    pub fn predict_f32(&self, x: &[Vec<f32>]) -> Result<Vec<usize>, ModelError> {
        x.iter()
            .map(|row| {
                let scaled = self.scaler.transform_row(row)?;
                self.classifier.predict_row(&scaled)
            })
            .collect()
    }
}

impl Classifier for Pipeline {
    fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    fn n_classes(&self) -> usize {
        self.classifier.n_classes
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, ModelError> {
        self.predict_f32(&rows_to_f32(rows, self.n_features())?)
    }

    fn supports_proba(&self) -> bool {
        true
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Option<Result<Vec<Vec<f32>>, ModelError>> {
        Some(
            rows_to_f32(rows, self.n_features())
                .and_then(|narrowed| self.predict_proba_f32(&narrowed)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn fitted() -> Pipeline {
        let iris = Dataset::iris().unwrap();
        let options = ForestOptions {
            n_trees: 20,
            ..ForestOptions::default()
        };
        Pipeline::fit(&iris.x, &iris.y, iris.n_classes(), &options).unwrap()
    }

    #[test]
    fn classifies_canonical_samples() {
        let pipeline = fitted();
        let rows = vec![
            vec![5.1, 3.5, 1.4, 0.2],
            vec![6.0, 2.9, 4.5, 1.5],
            vec![7.7, 3.0, 6.1, 2.3],
        ];
        assert_eq!(Classifier::predict(&pipeline, &rows).unwrap(), vec![0, 1, 2]);

        let proba = Classifier::predict_proba(&pipeline, &rows).unwrap().unwrap();
        assert_eq!(proba.len(), 3);
        assert!(proba[0][0] > 0.9);
    }

    #[test]
    fn non_finite_input_is_a_model_error() {
        let pipeline = fitted();
        let rows = vec![vec![f64::NAN, 3.5, 1.4, 0.2]];
        assert_eq!(
            Classifier::predict(&pipeline, &rows),
            Err(ModelError::NonFiniteInput)
        );
        assert!(matches!(
            Classifier::predict_proba(&pipeline, &rows),
            Some(Err(ModelError::NonFiniteInput))
        ));
    }

    #[test]
    fn survives_json_round_trip() {
        let pipeline = fitted();
        let json = serde_json::to_string(&pipeline).unwrap();
        let restored: Pipeline = serde_json::from_str(&json).unwrap();
        let row = vec![vec![6.3, 3.3, 6.0, 2.5]];
        assert_eq!(
            Classifier::predict(&restored, &row).unwrap(),
            Classifier::predict(&pipeline, &row).unwrap()
        );
    }
}
