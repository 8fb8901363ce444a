//! Exploratory summaries printed by the trainer before fitting.

use super::Dataset;

/// Per-feature summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSummary {
    pub name: String,
    /// Number of finite values.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (`n - 1` denominator).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarize every feature column, ignoring non-finite values.
pub fn describe(dataset: &Dataset) -> Vec<FeatureSummary> {
    (0..dataset.n_features())
        .map(|col| {
            let mut values: Vec<f64> = dataset
                .x
                .iter()
                .filter_map(|row| row.get(col).copied())
                .filter(|v| v.is_finite())
                .map(f64::from)
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            summarize(dataset.feature_names[col].clone(), &values)
        })
        .collect()
}

fn summarize(name: String, sorted: &[f64]) -> FeatureSummary {
    let count = sorted.len();
    if count == 0 {
        return FeatureSummary {
            name,
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = sorted.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };
    FeatureSummary {
        name,
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q75: quantile(sorted, 0.75),
        max: sorted[count - 1],
    }
}

/// Linearly interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Number of samples per class, indexed by class id.
pub fn class_distribution(dataset: &Dataset) -> Vec<usize> {
    let mut counts = vec![0usize; dataset.n_classes()];
    for &class_id in &dataset.y {
        if let Some(count) = counts.get_mut(class_id) {
            *count += 1;
        }
    }
    counts
}

/// Number of non-finite values per feature column.
pub fn missing_values(dataset: &Dataset) -> Vec<usize> {
    let mut counts = vec![0usize; dataset.n_features()];
    for row in &dataset.x {
        for (col, value) in row.iter().enumerate() {
            if !value.is_finite()
                && let Some(count) = counts.get_mut(col)
            {
                *count += 1;
            }
        }
    }
    counts
}

/// Render the first `n` rows as a fixed-width table.
pub fn format_head(dataset: &Dataset, n: usize) -> String {
    let widths: Vec<usize> = dataset.feature_names.iter().map(|name| name.len()).collect();
    let mut out = String::new();
    let header: Vec<String> = dataset
        .feature_names
        .iter()
        .map(|name| name.to_string())
        .collect();
    out.push_str(&header.join("  "));
    for row in dataset.x.iter().take(n) {
        out.push('\n');
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{value:>width$}"))
            .collect();
        out.push_str(&cells.join("  "));
    }
    out
}

/// Render the describe table with one column per feature.
pub fn format_describe(summaries: &[FeatureSummary]) -> String {
    let widths: Vec<usize> = summaries.iter().map(|s| s.name.len().max(10)).collect();
    let mut out = format!("{:<6}", "");
    for (summary, &width) in summaries.iter().zip(&widths) {
        out.push_str(&format!("  {:>width$}", summary.name));
    }
    let rows: [(&str, fn(&FeatureSummary) -> f64); 8] = [
        ("count", |s| s.count as f64),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q25),
        ("50%", |s| s.median),
        ("75%", |s| s.q75),
        ("max", |s| s.max),
    ];
    for (label, value) in rows {
        out.push_str(&format!("\n{label:<6}"));
        for (summary, &width) in summaries.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$.6}", value(summary)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_matches_known_iris_values() {
        let iris = Dataset::iris().unwrap();
        let summaries = describe(&iris);
        let sepal_length = &summaries[0];
        assert_eq!(sepal_length.count, 150);
        assert!((sepal_length.mean - 5.843333).abs() < 1e-4);
        assert!((sepal_length.std - 0.828066).abs() < 1e-4);
        assert!((sepal_length.min - 4.3).abs() < 1e-5);
        assert!((sepal_length.q25 - 5.1).abs() < 1e-5);
        assert!((sepal_length.median - 5.8).abs() < 1e-5);
        assert!((sepal_length.q75 - 6.4).abs() < 1e-5);
        assert!((sepal_length.max - 7.9).abs() < 1e-5);
    }

    #[test]
    fn quantile_interpolates_between_values() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.5), 2.5);
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 1.0), 4.0);
    }

    #[test]
    fn distribution_and_missing_counts() {
        let mut data = Dataset::from_csv_str("a,b,label\n1,2,x\n3,4,y\n5,6,x\n").unwrap();
        data.x[1][1] = f32::NAN;
        assert_eq!(class_distribution(&data), vec![2, 1]);
        assert_eq!(missing_values(&data), vec![0, 1]);

        let summaries = describe(&data);
        assert_eq!(summaries[1].count, 2);
    }

    #[test]
    fn head_lists_requested_rows() {
        let iris = Dataset::iris().unwrap();
        let head = format_head(&iris, 5);
        assert_eq!(head.lines().count(), 6);
        assert!(head.starts_with("sepal length (cm)"));
        assert!(format_describe(&describe(&iris)).contains("mean"));
    }
}
