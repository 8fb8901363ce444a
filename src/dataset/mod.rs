//! Tabular training data: the bundled Iris reference set and CSV loading.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

pub mod split;
pub mod stats;

pub use split::{Split, stratified_split};

/// Bundled reference dataset, one header row followed by 150 samples.
const IRIS_CSV: &str = include_str!("../../assets/iris.csv");

/// Number of features per sample in the reference dataset.
pub const IRIS_FEATURE_COUNT: usize = 4;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset is empty")]
    Empty,
    #[error("header needs at least one feature column and a label column")]
    InvalidHeader,
    #[error("line {line}: expected {expected} columns, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid number {value:?}")]
    InvalidNumber { line: usize, value: String },
    #[error("line {line}: empty class label")]
    EmptyLabel { line: usize },
}

/// In-memory labelled dataset with row-major features.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Column names of the feature matrix.
    pub feature_names: Vec<String>,
    /// Class names indexed by class id.
    pub target_names: Vec<String>,
    pub x: Vec<Vec<f32>>,
    /// Class ids aligned with `x`.
    pub y: Vec<usize>,
}

impl Dataset {
    /// The bundled Iris dataset.
    pub fn iris() -> Result<Self, DatasetError> {
        Self::from_csv_str(IRIS_CSV)
    }

    /// Load a dataset from a CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv_str(&text)
    }

    /// Parse CSV text: a header row, numeric feature columns and a trailing
    /// class-name column.
    ///
    /// Class ids follow the order in which class names first appear.
    pub fn from_csv_str(text: &str) -> Result<Self, DatasetError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (_, header) = lines.next().ok_or(DatasetError::Empty)?;
        let columns: Vec<String> = header.split(',').map(|c| c.trim().to_string()).collect();
        if columns.len() < 2 {
            return Err(DatasetError::InvalidHeader);
        }
        let n_features = columns.len() - 1;
        let feature_names = columns[..n_features].to_vec();

        let mut class_ids: BTreeMap<String, usize> = BTreeMap::new();
        let mut target_names = Vec::new();
        let mut x = Vec::new();
        let mut y = Vec::new();
        for (line_no, line) in lines {
            let cells: Vec<&str> = line.split(',').map(str::trim).collect();
            if cells.len() != columns.len() {
                return Err(DatasetError::RaggedRow {
                    line: line_no,
                    expected: columns.len(),
                    found: cells.len(),
                });
            }
            let mut row = Vec::with_capacity(n_features);
            for cell in &cells[..n_features] {
                let value = cell
                    .parse::<f32>()
                    .map_err(|_| DatasetError::InvalidNumber {
                        line: line_no,
                        value: cell.to_string(),
                    })?;
                row.push(value);
            }
            let label = cells[n_features];
            if label.is_empty() {
                return Err(DatasetError::EmptyLabel { line: line_no });
            }
            let class_id = *class_ids.entry(label.to_string()).or_insert_with(|| {
                target_names.push(label.to_string());
                target_names.len() - 1
            });
            x.push(row);
            y.push(class_id);
        }
        if x.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self {
            feature_names,
            target_names,
            x,
            y,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn n_classes(&self) -> usize {
        self.target_names.len()
    }

    /// Copy the rows at `indices` into a new dataset with the same metadata.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            target_names: self.target_names.clone(),
            x: indices.iter().map(|&i| self.x[i].clone()).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_iris_has_expected_shape() {
        let iris = Dataset::iris().unwrap();
        assert_eq!(iris.len(), 150);
        assert_eq!(iris.n_features(), IRIS_FEATURE_COUNT);
        assert_eq!(iris.target_names, vec!["setosa", "versicolor", "virginica"]);
        assert_eq!(iris.feature_names[0], "sepal length (cm)");
        assert_eq!(iris.x[0], vec![5.1, 3.5, 1.4, 0.2]);
        for class_id in 0..3 {
            assert_eq!(iris.y.iter().filter(|&&c| c == class_id).count(), 50);
        }
    }

    #[test]
    fn csv_errors_carry_line_numbers() {
        let ragged = "a,b,label\n1,2,x\n3,y\n";
        assert!(matches!(
            Dataset::from_csv_str(ragged),
            Err(DatasetError::RaggedRow {
                line: 3,
                expected: 3,
                found: 2
            })
        ));

        let bad_number = "a,label\n1.5,x\nabc,y\n";
        match Dataset::from_csv_str(bad_number) {
            Err(DatasetError::InvalidNumber { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            Dataset::from_csv_str("a,label\n"),
            Err(DatasetError::Empty)
        ));
        assert!(matches!(
            Dataset::from_csv_str("label\n1\n"),
            Err(DatasetError::InvalidHeader)
        ));
    }

    #[test]
    fn subset_keeps_metadata() {
        let iris = Dataset::iris().unwrap();
        let sub = iris.subset(&[0, 149]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.y, vec![0, 2]);
        assert_eq!(sub.target_names, iris.target_names);
    }
}
