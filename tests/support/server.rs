use std::path::Path;
use std::sync::{Arc, LazyLock, mpsc};
use std::thread::JoinHandle;

use iris_serve::artifact::ModelArtifact;
use iris_serve::dataset::Dataset;
use iris_serve::serve::{self, ServiceState};
use iris_serve::training::{TrainOptions, fit_and_evaluate};
use serde_json::Value;

static TRAINED: LazyLock<ModelArtifact> = LazyLock::new(|| {
    let iris = Dataset::iris().expect("bundled iris");
    let options = TrainOptions {
        n_trees: 25,
        ..TrainOptions::default()
    };
    fit_and_evaluate(&iris, &options)
        .expect("train iris model")
        .artifact
});

/// Artifact trained once per test binary.
pub fn trained_artifact() -> ModelArtifact {
    TRAINED.clone()
}

/// Server running on an ephemeral localhost port in a background thread.
pub struct TestServer {
    base_url: String,
    shutdown: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a server that loads its model from `model_path`.
    pub fn start(model_path: &Path) -> Self {
        Self::with_state(ServiceState::load(model_path))
    }

    /// Start a server around an artifact that never touches disk.
    pub fn in_memory(artifact: ModelArtifact) -> Self {
        Self::with_state(ServiceState::with_artifact(Some(artifact), "in-memory".into()))
    }

    fn with_state(state: ServiceState) -> Self {
        let state = Arc::new(state);
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("listener addr");
        let (tx, rx) = mpsc::channel::<()>();

        let handle = std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                let shutdown = async move {
                    let _ = tokio::task::spawn_blocking(move || rx.recv()).await;
                };
                serve::serve(listener, state, shutdown)
                    .await
                    .expect("serve");
            });
        });

        Self {
            base_url: format!("http://{addr}"),
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> (u16, Value) {
        read_response(ureq::get(&self.url(path)).call())
    }

    pub fn post_raw(&self, path: &str, body: &str) -> (u16, Value) {
        read_response(
            ureq::post(&self.url(path))
                .set("Content-Type", "application/json")
                .send_string(body),
        )
    }

    pub fn post_json(&self, path: &str, body: &Value) -> (u16, Value) {
        self.post_raw(path, &body.to_string())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read_response(result: Result<ureq::Response, ureq::Error>) -> (u16, Value) {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(err) => panic!("request failed: {err}"),
    };
    let status = response.status();
    let body = response.into_json::<Value>().expect("json response body");
    (status, body)
}
