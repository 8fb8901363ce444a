//! Library exports for the trainer, the server binary and tests.
/// Application data directories.
pub mod app_dirs;
/// Serialized model artifact.
pub mod artifact;
/// Server configuration.
pub mod config;
/// Tabular dataset loading, splitting and summaries.
pub mod dataset;
/// Tracing setup.
pub mod logging;
/// Preprocessing, classifiers and evaluation metrics.
pub mod ml;
/// HTTP prediction service.
pub mod serve;
/// Training and evaluation runs.
pub mod training;
