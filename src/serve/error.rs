use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use super::input::InputError;
use crate::ml::ModelError;

/// Errors reported by the prediction endpoint.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Malformed or mis-shaped request body.
    #[error("{0}")]
    InvalidInput(String),
    /// No artifact was loaded at startup.
    #[error("Model not loaded")]
    ModelUnavailable,
    /// The model failed on otherwise valid input.
    #[error("Prediction failed: {0}")]
    PredictionError(#[from] ModelError),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServeError::ModelUnavailable | ServeError::PredictionError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServeError::InvalidInput(_) => "InvalidInput",
            ServeError::ModelUnavailable => "ModelUnavailable",
            ServeError::PredictionError(_) => "PredictionError",
        }
    }
}

impl From<InputError> for ServeError {
    fn from(err: InputError) -> Self {
        ServeError::InvalidInput(err.to_string())
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let body = json!({"error": self.to_string(), "kind": self.kind()});
        (self.status(), Json(body)).into_response()
    }
}
