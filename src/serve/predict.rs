//! Model invocation and response shaping.

use serde::Serialize;

use super::error::ServeError;
use super::input::Batch;
use crate::ml::{Classifier, argmax};

/// Human-readable class name, or the raw id when no names are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Name(String),
    Id(usize),
}

/// Prediction for one input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub predicted_class: ClassLabel,
    pub predicted_label: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f32>>,
}

/// Response body: a bare object for one result, an array otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Single(Prediction),
    Batch(Vec<Prediction>),
}

impl PredictionOutput {
    fn from_results(mut results: Vec<Prediction>) -> Self {
        if results.len() == 1
            && let Some(only) = results.pop()
        {
            return PredictionOutput::Single(only);
        }
        PredictionOutput::Batch(results)
    }

    pub fn len(&self) -> usize {
        match self {
            PredictionOutput::Single(_) => 1,
            PredictionOutput::Batch(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify every row of `batch`, preserving order.
///
/// Probability-capable models are evaluated once and the class is the argmax
/// of each row's probabilities.
pub fn predict(
    model: &dyn Classifier,
    target_names: Option<&[String]>,
    batch: &Batch,
) -> Result<PredictionOutput, ServeError> {
    let probabilities = if model.supports_proba() {
        model.predict_proba(batch).transpose()?
    } else {
        None
    };
    let class_ids = match &probabilities {
        Some(rows) => rows.iter().map(|row| argmax(row)).collect(),
        None => model.predict(batch)?,
    };

    let names = target_names.filter(|names| !names.is_empty());
    let results = class_ids
        .into_iter()
        .enumerate()
        .map(|(idx, class_id)| Prediction {
            predicted_class: names
                .and_then(|names| names.get(class_id))
                .map(|name| ClassLabel::Name(name.clone()))
                .unwrap_or(ClassLabel::Id(class_id)),
            predicted_label: class_id,
            probabilities: probabilities
                .as_ref()
                .and_then(|rows| rows.get(idx).cloned()),
        })
        .collect();
    Ok(PredictionOutput::from_results(results))
}
