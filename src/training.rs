//! Fit, evaluate and serialize the classification pipeline.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::artifact::{ArtifactError, ModelArtifact};
use crate::dataset::{Dataset, DatasetError, stratified_split};
use crate::ml::metrics::{ClassificationReport, ConfusionMatrix};
use crate::ml::{ForestOptions, ModelError, Pipeline};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Failed to write metrics {path}: {source}")]
    WriteMetrics {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode metrics: {0}")]
    EncodeMetrics(serde_json::Error),
    #[error("test split is empty; lower the test fraction or add samples")]
    EmptyTestSplit,
}

/// Training hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Seed for both the split and the forest.
    pub seed: u64,
    pub n_trees: usize,
    pub test_fraction: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            n_trees: 100,
            test_fraction: 0.2,
        }
    }
}

/// Held-out evaluation written next to the artifact.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub accuracy: f64,
    pub classification_report: ClassificationReport,
}

/// Everything a training run produces before it touches the filesystem.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub artifact: ModelArtifact,
    pub metrics: MetricsReport,
    pub confusion: ConfusionMatrix,
    pub train_len: usize,
    pub test_len: usize,
}

/// Split, fit on the training side and evaluate on the held-out side.
pub fn fit_and_evaluate(
    dataset: &Dataset,
    options: &TrainOptions,
) -> Result<TrainOutcome, TrainError> {
    let split = stratified_split(dataset, options.test_fraction, options.seed)?;
    if split.test.is_empty() {
        return Err(TrainError::EmptyTestSplit);
    }
    tracing::info!(
        train = split.train.len(),
        test = split.test.len(),
        seed = options.seed,
        "Split dataset"
    );

    let forest_options = ForestOptions {
        n_trees: options.n_trees,
        seed: options.seed,
        ..ForestOptions::default()
    };
    let model = Pipeline::fit(
        &split.train.x,
        &split.train.y,
        dataset.n_classes(),
        &forest_options,
    )?;
    tracing::info!(trees = options.n_trees, "Fitted pipeline");

    let predicted = model.predict_f32(&split.test.x)?;
    let confusion =
        ConfusionMatrix::from_predictions(dataset.n_classes(), &split.test.y, &predicted);
    let classification_report =
        ClassificationReport::from_confusion(&confusion, &dataset.target_names);
    let metrics = MetricsReport {
        accuracy: classification_report.accuracy,
        classification_report,
    };
    tracing::info!(accuracy = metrics.accuracy, "Evaluated on held-out split");

    let artifact = ModelArtifact::new(
        model,
        Some(dataset.target_names.clone()),
        Some(dataset.feature_names.clone()),
    );
    artifact.validate()?;
    Ok(TrainOutcome {
        artifact,
        metrics,
        confusion,
        train_len: split.train.len(),
        test_len: split.test.len(),
    })
}

/// Write the metrics report as pretty JSON, creating parent directories.
pub fn save_metrics(metrics: &MetricsReport, path: &Path) -> Result<(), TrainError> {
    let write_err = |source: std::io::Error| TrainError::WriteMetrics {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let bytes = serde_json::to_vec_pretty(metrics).map_err(TrainError::EncodeMetrics)?;
    std::fs::write(path, bytes).map_err(write_err)
}

/// Run a full training cycle and persist the artifact and metrics.
pub fn train_and_save(
    dataset: &Dataset,
    options: &TrainOptions,
    artifact_path: &Path,
    metrics_path: &Path,
) -> Result<TrainOutcome, TrainError> {
    let outcome = fit_and_evaluate(dataset, options)?;
    outcome.artifact.save_json(artifact_path)?;
    tracing::info!("Saved model pipeline to {}", artifact_path.display());
    save_metrics(&outcome.metrics, metrics_path)?;
    tracing::info!("Saved metrics to {}", metrics_path.display());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quick() -> TrainOptions {
        TrainOptions {
            n_trees: 15,
            ..TrainOptions::default()
        }
    }

    #[test]
    fn evaluates_on_thirty_held_out_rows() {
        let iris = Dataset::iris().unwrap();
        let outcome = fit_and_evaluate(&iris, &quick()).unwrap();
        assert_eq!(outcome.train_len, 120);
        assert_eq!(outcome.test_len, 30);
        assert_eq!(outcome.confusion.total(), 30);
        assert!(outcome.metrics.accuracy >= 0.85);
        assert_eq!(outcome.metrics.classification_report.classes.len(), 3);
    }

    #[test]
    fn rejects_split_without_test_rows() {
        let iris = Dataset::iris().unwrap();
        let options = TrainOptions {
            test_fraction: 0.0,
            ..quick()
        };
        assert!(matches!(
            fit_and_evaluate(&iris, &options),
            Err(TrainError::EmptyTestSplit)
        ));
    }

    #[test]
    fn writes_artifact_and_metrics() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let metrics_path = dir.path().join("out").join("metrics.json");
        let iris = Dataset::iris().unwrap();
        let outcome = train_and_save(&iris, &quick(), &model_path, &metrics_path).unwrap();

        let loaded = ModelArtifact::load_json(&model_path).unwrap();
        assert_eq!(loaded.target_names, outcome.artifact.target_names);
        assert_eq!(
            loaded.model.predict_f32(&iris.x).unwrap(),
            outcome.artifact.model.predict_f32(&iris.x).unwrap()
        );

        let metrics: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&metrics_path).unwrap()).unwrap();
        let accuracy = metrics["accuracy"].as_f64().unwrap();
        assert!((accuracy - outcome.metrics.accuracy).abs() < 1e-12);
        assert!(metrics["classification_report"]["setosa"]["f1-score"].is_number());
        assert!(metrics["classification_report"]["weighted avg"].is_object());
    }

    #[test]
    fn deep_single_feature_model_reloads() {
        let mut csv = String::from("f,label\n");
        for i in 0..2000 {
            csv.push_str(&format!("{i},{}\n", if i % 2 == 0 { "a" } else { "b" }));
        }
        let dataset = Dataset::from_csv_str(&csv).unwrap();
        let options = TrainOptions {
            n_trees: 1,
            ..TrainOptions::default()
        };
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let outcome =
            train_and_save(&dataset, &options, &model_path, &dir.path().join("metrics.json"))
                .unwrap();

        let loaded = ModelArtifact::load_json(&model_path).unwrap();
        let fitted = &outcome.artifact.model.classifier.trees[0];
        let reloaded = &loaded.model.classifier.trees[0];
        assert!(fitted.depth() > 10);
        assert_eq!(reloaded.depth(), fitted.depth());
        assert_eq!(reloaded.nodes.len(), fitted.nodes.len());
    }
}
