//! Evaluation metrics for classification models.

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Build a matrix from aligned truth/prediction slices.
    pub fn from_predictions(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Compute per-class precision, recall and F1 from a confusion matrix.
///
/// Undefined ratios (no predictions or no support) are reported as `0.0`.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f64;
        let mut fp = 0f64;
        let mut fn_ = 0f64;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f64;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f64;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        stats.push(PerClassStats {
            precision,
            recall,
            f1,
            support,
        });
    }
    stats
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let total = cm.total();
    if total == 0 {
        return 0.0;
    }
    let correct: u32 = (0..cm.n_classes).map(|i| cm.get(i, i)).sum();
    correct as f64 / total as f64
}

/// Per-class and averaged precision/recall/F1 on a held-out set.
///
/// Serializes as a map keyed by class name followed by `accuracy`,
/// `macro avg` and `weighted avg`; each entry holds `precision`, `recall`,
/// `f1-score` and `support`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<(String, PerClassStats)>,
    pub accuracy: f64,
    pub macro_avg: PerClassStats,
    pub weighted_avg: PerClassStats,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix, class_names: &[String]) -> Self {
        let stats = precision_recall_by_class(cm);
        let classes: Vec<(String, PerClassStats)> = stats
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let name = class_names
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| idx.to_string());
                (name, *s)
            })
            .collect();
        let support: u32 = stats.iter().map(|s| s.support).sum();
        let k = stats.len().max(1) as f64;
        let macro_avg = PerClassStats {
            precision: stats.iter().map(|s| s.precision).sum::<f64>() / k,
            recall: stats.iter().map(|s| s.recall).sum::<f64>() / k,
            f1: stats.iter().map(|s| s.f1).sum::<f64>() / k,
            support,
        };
        let weighted = |f: fn(&PerClassStats) -> f64| {
            if support == 0 {
                0.0
            } else {
                stats.iter().map(|s| f(s) * s.support as f64).sum::<f64>() / support as f64
            }
        };
        let weighted_avg = PerClassStats {
            precision: weighted(|s| s.precision),
            recall: weighted(|s| s.recall),
            f1: weighted(|s| s.f1),
            support,
        };
        Self {
            classes,
            accuracy: accuracy(cm),
            macro_avg,
            weighted_avg,
        }
    }

    /// Fixed-width text rendering for terminal output.
    pub fn to_text(&self) -> String {
        let width = self
            .classes
            .iter()
            .map(|(name, _)| name.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);
        let mut out = format!(
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}\n\n",
            "", "precision", "recall", "f1-score", "support"
        );
        let line = |name: &str, s: &PerClassStats| {
            format!(
                "{name:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}\n",
                s.precision, s.recall, s.f1, s.support
            )
        };
        for (name, stats) in &self.classes {
            out.push_str(&line(name, stats));
        }
        out.push('\n');
        out.push_str(&format!(
            "{:>width$}  {:>9}  {:>9}  {:>9.2}  {:>9}\n",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        ));
        out.push_str(&line("macro avg", &self.macro_avg));
        out.push_str(&line("weighted avg", &self.weighted_avg));
        out
    }
}

struct StatsEntry<'a>(&'a PerClassStats);

impl Serialize for StatsEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("precision", &self.0.precision)?;
        map.serialize_entry("recall", &self.0.recall)?;
        map.serialize_entry("f1-score", &self.0.f1)?;
        map.serialize_entry("support", &self.0.support)?;
        map.end()
    }
}

impl Serialize for ClassificationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.classes.len() + 3))?;
        for (name, stats) in &self.classes {
            map.serialize_entry(name, &StatsEntry(stats))?;
        }
        map.serialize_entry("accuracy", &self.accuracy)?;
        map.serialize_entry("macro avg", &StatsEntry(&self.macro_avg))?;
        map.serialize_entry("weighted avg", &StatsEntry(&self.weighted_avg))?;
        map.end()
    }
}

/// Render a confusion matrix with rows as truth and columns as predictions.
pub fn format_confusion(cm: &ConfusionMatrix) -> String {
    let mut out = String::new();
    for truth in 0..cm.n_classes {
        for pred in 0..cm.n_classes {
            out.push_str(&format!("{:6}", cm.get(truth, pred)));
        }
        out.push('\n');
    }
    out
}
