use iris_serve::artifact::ModelArtifact;
use iris_serve::dataset::Dataset;
use iris_serve::training::{TrainOptions, train_and_save};

#[test]
fn same_seed_reproduces_accuracy_and_artifact() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let iris = Dataset::iris().expect("bundled iris");
    let options = TrainOptions {
        n_trees: 30,
        ..TrainOptions::default()
    };

    let first = train_and_save(
        &iris,
        &options,
        &temp.path().join("a/model.json"),
        &temp.path().join("a/metrics.json"),
    )
    .expect("first run");
    let second = train_and_save(
        &iris,
        &options,
        &temp.path().join("b/model.json"),
        &temp.path().join("b/metrics.json"),
    )
    .expect("second run");

    assert_eq!(first.metrics.accuracy, second.metrics.accuracy);
    assert_eq!(first.artifact, second.artifact);
    assert_eq!(
        std::fs::read(temp.path().join("a/model.json")).unwrap(),
        std::fs::read(temp.path().join("b/model.json")).unwrap()
    );
    assert!(first.metrics.accuracy > 0.85);
}

#[test]
fn saved_artifact_reloads_with_metadata() {
    let temp = tempfile::tempdir().expect("create tempdir");
    let model_path = temp.path().join("model.json");
    let iris = Dataset::iris().expect("bundled iris");
    let options = TrainOptions {
        n_trees: 10,
        ..TrainOptions::default()
    };
    train_and_save(&iris, &options, &model_path, &temp.path().join("metrics.json"))
        .expect("train");

    let artifact = ModelArtifact::load_json(&model_path).expect("reload");
    assert_eq!(artifact.feature_count(), 4);
    assert_eq!(
        artifact.target_names.as_deref(),
        Some(
            &[
                "setosa".to_string(),
                "versicolor".to_string(),
                "virginica".to_string()
            ][..]
        )
    );
}

#[test]
fn different_test_fraction_changes_split_sizes() {
    let iris = Dataset::iris().expect("bundled iris");
    let options = TrainOptions {
        n_trees: 5,
        test_fraction: 0.4,
        ..TrainOptions::default()
    };
    let outcome = iris_serve::training::fit_and_evaluate(&iris, &options).expect("train");
    assert_eq!(outcome.test_len, 60);
    assert_eq!(outcome.train_len, 90);
}
