use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::{Value, json};

use super::SharedState;
use super::error::ServeError;
use super::input::normalize_input;
use super::predict::{PredictionOutput, predict};

/// `GET /`: service description with request examples.
pub(crate) async fn index(State(state): State<SharedState>) -> Json<Value> {
    let feature_names = state
        .artifact()
        .and_then(|artifact| artifact.feature_names.clone());
    Json(json!({
        "service": "Iris classifier API",
        "endpoints": {
            "GET /health": "Health check",
            "POST /predict": {
                "description": "Predict iris species from features",
                "input_format_examples": [
                    {"input": [5.1, 3.5, 1.4, 0.2]},
                    {"input": [[5.1, 3.5, 1.4, 0.2], [6.0, 2.9, 4.5, 1.5]]}
                ],
                "feature_names": feature_names
            }
        }
    }))
}

/// `GET /health`.
pub(crate) async fn health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({"status": "ok", "model_loaded": state.model_loaded()}))
}

/// `POST /predict`. The body is parsed as JSON regardless of content type.
pub(crate) async fn predict_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PredictionOutput>, ServeError> {
    let Some(artifact) = state.artifact() else {
        tracing::warn!(
            "Prediction requested but no model is loaded from {}",
            state.model_path().display()
        );
        return Err(ServeError::ModelUnavailable);
    };
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ServeError::InvalidInput("Invalid JSON payload".to_string()))?;
    let batch = normalize_input(&payload, artifact.feature_count()).inspect_err(|err| {
        tracing::debug!("Rejected prediction request: {err}");
    })?;
    let output = predict(&artifact.model, artifact.target_names.as_deref(), &batch)
        .inspect_err(|err| tracing::error!("Prediction error: {err}"))?;
    tracing::debug!(rows = batch.len(), "Served prediction");
    Ok(Json(output))
}
