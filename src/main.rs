//! Entry point for the Iris prediction server.

use std::sync::Arc;

use iris_serve::config::ServeConfig;
use iris_serve::logging;
use iris_serve::serve::{self, ServiceState};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = ServeConfig::load().map_err(|err| err.to_string())?;
    if let Err(err) = logging::init("iris-serve", config.log_dir.as_deref()) {
        eprintln!("Logging disabled: {err}");
    }
    let addr = config.bind_addr().map_err(|err| err.to_string())?;
    let state = Arc::new(ServiceState::load(&config.model_path));

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|err| format!("Failed to start async runtime: {err}"))?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("Failed to bind {addr}: {err}"))?;
        serve::serve(listener, state, serve::shutdown_signal())
            .await
            .map_err(|err| format!("Server error: {err}"))
    })
}
