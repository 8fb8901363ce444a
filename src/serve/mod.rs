//! HTTP prediction service.

pub mod error;
mod handlers;
pub mod input;
pub mod predict;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use crate::artifact::ModelArtifact;

pub use error::ServeError;

/// Shared handle passed to every handler.
pub type SharedState = Arc<ServiceState>;

/// Model artifact loaded once at startup; read-only afterwards.
#[derive(Debug)]
pub struct ServiceState {
    artifact: Option<ModelArtifact>,
    model_path: PathBuf,
}

impl ServiceState {
    /// Load the artifact at `path`. A missing or unreadable artifact leaves the
    /// service running without a model.
    pub fn load(path: &Path) -> Self {
        let artifact = match ModelArtifact::load_json(path) {
            Ok(artifact) => {
                tracing::info!(
                    trees = artifact.model.classifier.trees.len(),
                    "Loaded model from {}",
                    path.display()
                );
                Some(artifact)
            }
            Err(err) => {
                tracing::error!("Failed to load model from {}: {err}", path.display());
                None
            }
        };
        Self {
            artifact,
            model_path: path.to_path_buf(),
        }
    }

    /// Wrap an artifact that is already in memory. `model_path` is only
    /// reported in logs.
    pub fn with_artifact(artifact: Option<ModelArtifact>, model_path: PathBuf) -> Self {
        Self {
            artifact,
            model_path,
        }
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        self.artifact.as_ref()
    }

    pub fn model_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

/// Build the service router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict_handler))
        .with_state(state)
}

/// Serve requests on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: SharedState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(
            model_loaded = state.model_loaded(),
            "Listening on http://{addr}"
        );
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(err) => tracing::warn!("Failed to listen for shutdown signal: {err}"),
    }
}
