//! Request payload validation.

use serde_json::Value;
use thiserror::Error;

/// Rectangular batch of feature rows.
pub type Batch = Vec<Vec<f64>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Missing 'input' key in JSON payload.")]
    MissingInput,
    #[error("'input' must be a list of {0} numeric features or list of such lists.")]
    NotAList(usize),
    #[error("Each input sample must have {0} features.")]
    WrongFeatureCount(usize),
    #[error("Input values must be numeric.")]
    NotNumeric,
}

/// Normalize the `input` field of a request body into a batch.
///
/// A flat list of values is promoted to a batch of one. Every row must have
/// exactly `feature_count` numeric-coercible values.
pub fn normalize_input(payload: &Value, feature_count: usize) -> Result<Batch, InputError> {
    let input = payload
        .as_object()
        .and_then(|obj| obj.get("input"))
        .ok_or(InputError::MissingInput)?;
    let items = input.as_array().ok_or(InputError::NotAList(feature_count))?;

    let rows: Vec<&Vec<Value>> = match items.first() {
        Some(first) if !first.is_array() => vec![items],
        _ => items
            .iter()
            .map(|row| row.as_array().ok_or(InputError::NotAList(feature_count)))
            .collect::<Result<_, _>>()?,
    };

    if rows.is_empty() || rows.iter().any(|row| row.len() != feature_count) {
        return Err(InputError::WrongFeatureCount(feature_count));
    }
    rows.into_iter()
        .map(|row| row.iter().map(coerce_number).collect::<Result<Vec<f64>, _>>())
        .collect()
}

/// Numbers pass through, booleans map to 1/0 and numeric strings are parsed.
fn coerce_number(value: &Value) -> Result<f64, InputError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(InputError::NotNumeric),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| InputError::NotNumeric),
        _ => Err(InputError::NotNumeric),
    }
}
