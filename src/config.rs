//! Service configuration: built-in defaults, an optional TOML file, then
//! environment overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;

/// Default artifact path, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "model.json";
/// Environment variable naming the artifact path.
pub const MODEL_PATH_ENV: &str = "MODEL_PATH";
/// Environment variable naming the listen port.
pub const PORT_ENV: &str = "PORT";
/// Environment variable naming the listen host.
pub const HOST_ENV: &str = "HOST";
/// Environment variable naming an explicit TOML config file.
pub const CONFIG_PATH_ENV: &str = "IRIS_SERVE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid {name} value: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("Invalid listen address {host}:{port}")]
    InvalidAddr { host: String, port: u16 },
}

/// Settings for the prediction server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Location of the serialized model artifact.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory for log files; the application logs dir when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            host: default_host(),
            port: default_port(),
            log_dir: None,
        }
    }
}

impl ServeConfig {
    /// Resolve the configuration from the process environment.
    ///
    /// The TOML file named by `IRIS_SERVE_CONFIG` is required to exist; the
    /// one in the app directory is only read when present.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match app_dirs::config_file_path() {
                Ok(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file; missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment-style overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(MODEL_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.model_path = PathBuf::from(path);
        }
        if let Some(host) = lookup(HOST_ENV).filter(|v| !v.trim().is_empty()) {
            self.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: PORT_ENV,
                value: port.clone(),
            })?;
        }
        Ok(())
    }

    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddr {
                host: self.host.clone(),
                port: self.port,
            })
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}
