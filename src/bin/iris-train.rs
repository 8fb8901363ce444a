//! Train the Iris pipeline and write the model artifact plus metrics.

use std::path::PathBuf;

use iris_serve::config::DEFAULT_MODEL_PATH;
use iris_serve::dataset::{Dataset, stats};
use iris_serve::logging;
use iris_serve::ml::metrics::format_confusion;
use iris_serve::training::{TrainOptions, train_and_save};

const HEAD_ROWS: usize = 5;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init("iris-train", None) {
        eprintln!("Logging disabled: {err}");
    }

    let dataset = match &options.dataset {
        Some(path) => Dataset::from_csv_path(path).map_err(|err| err.to_string())?,
        None => Dataset::iris().map_err(|err| err.to_string())?,
    };
    print_summary(&dataset);

    let outcome = train_and_save(
        &dataset,
        &options.train,
        &options.model_out,
        &options.metrics_out,
    )
    .map_err(|err| err.to_string())?;

    println!(
        "\nTrained on {} rows, evaluated on {} rows.",
        outcome.train_len, outcome.test_len
    );
    println!("Test accuracy: {:.4}", outcome.metrics.accuracy);
    println!("\nClassification report:\n");
    println!("{}", outcome.metrics.classification_report.to_text());
    println!("Confusion matrix (rows=true, cols=pred):");
    print!("{}", format_confusion(&outcome.confusion));
    println!("\nSaved model pipeline to {}", options.model_out.display());
    println!("Saved metrics to {}", options.metrics_out.display());
    Ok(())
}

fn print_summary(dataset: &Dataset) {
    println!("First {HEAD_ROWS} rows:");
    println!("{}", stats::format_head(dataset, HEAD_ROWS));

    println!("\nDataset description:");
    println!("{}", stats::format_describe(&stats::describe(dataset)));

    println!("\nTarget distribution:");
    for (name, count) in dataset
        .target_names
        .iter()
        .zip(stats::class_distribution(dataset))
    {
        println!("{name:<16}{count:>6}");
    }

    println!("\nMissing values per column:");
    for (name, count) in dataset
        .feature_names
        .iter()
        .zip(stats::missing_values(dataset))
    {
        println!("{name:<24}{count:>6}");
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    dataset: Option<PathBuf>,
    model_out: PathBuf,
    metrics_out: PathBuf,
    train: TrainOptions,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut dataset: Option<PathBuf> = None;
    let mut model_out = PathBuf::from(DEFAULT_MODEL_PATH);
    let mut metrics_out = PathBuf::from("metrics.json");
    let mut train = TrainOptions::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--dataset" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                dataset = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                model_out = PathBuf::from(value);
            }
            "--metrics" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--metrics requires a value".to_string())?;
                metrics_out = PathBuf::from(value);
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                train.seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--trees" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--trees requires a value".to_string())?;
                train.n_trees = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("Invalid --trees value: {value}"))?;
            }
            "--test-fraction" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--test-fraction requires a value".to_string())?;
                train.test_fraction = value
                    .parse::<f64>()
                    .ok()
                    .filter(|f| *f > 0.0 && *f < 1.0)
                    .ok_or_else(|| format!("Invalid --test-fraction value: {value}"))?;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    Ok(CliOptions {
        dataset,
        model_out,
        metrics_out,
        train,
    })
}

fn help_text() -> String {
    [
        "iris-train",
        "",
        "Trains a standardized random-forest classifier on the Iris dataset.",
        "",
        "Usage:",
        "  iris-train [--out model.json] [--metrics metrics.json] [options]",
        "",
        "Options:",
        "  --dataset <csv>          Features then a class column (default: bundled Iris).",
        "  --out <file>             Output model path (default: model.json).",
        "  --metrics <file>         Output metrics path (default: metrics.json).",
        "  --seed <n>               Seed for the split and the forest (default: 42).",
        "  --trees <n>              Number of trees (default: 100).",
        "  --test-fraction <f64>    Held-out fraction per class (default: 0.2).",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let options = parse_args(Vec::new()).unwrap();
        assert!(options.dataset.is_none());
        assert_eq!(options.model_out, PathBuf::from("model.json"));
        assert_eq!(options.metrics_out, PathBuf::from("metrics.json"));
        assert_eq!(options.train.seed, 42);
        assert_eq!(options.train.n_trees, 100);
    }

    #[test]
    fn parses_every_flag() {
        let options = parse_args(args(&[
            "--dataset",
            "data.csv",
            "--out",
            "out/model.json",
            "--metrics",
            "out/metrics.json",
            "--seed",
            "7",
            "--trees",
            "25",
            "--test-fraction",
            "0.3",
        ]))
        .unwrap();
        assert_eq!(options.dataset, Some(PathBuf::from("data.csv")));
        assert_eq!(options.model_out, PathBuf::from("out/model.json"));
        assert_eq!(options.train.seed, 7);
        assert_eq!(options.train.n_trees, 25);
        assert!((options.train.test_fraction - 0.3).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_args(args(&["--trees", "0"])).is_err());
        assert!(parse_args(args(&["--test-fraction", "1.5"])).is_err());
        assert!(parse_args(args(&["--seed"])).is_err());
        assert!(
            parse_args(args(&["--bogus"]))
                .unwrap_err()
                .starts_with("Unknown argument")
        );
    }
}
