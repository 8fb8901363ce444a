//! The serialized bundle shared by the trainer and the server.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::{Classifier, Pipeline};

/// Current artifact format version.
pub const ARTIFACT_FORMAT_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model artifact {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode model artifact: {0}")]
    Encode(serde_json::Error),
    #[error("Unsupported artifact format_version {found} (expected {expected})")]
    UnsupportedVersion { found: i64, expected: i64 },
    #[error("Tree {index} of the forest is malformed")]
    MalformedTree { index: usize },
    #[error("{field} has {found} entries but the model has {expected}")]
    MetadataMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Fitted pipeline plus label and feature metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default = "default_format_version")]
    pub format_version: i64,
    pub model: Pipeline,
    /// Class names indexed by class id.
    #[serde(default)]
    pub target_names: Option<Vec<String>>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

fn default_format_version() -> i64 {
    ARTIFACT_FORMAT_VERSION
}

impl ModelArtifact {
    pub fn new(
        model: Pipeline,
        target_names: Option<Vec<String>>,
        feature_names: Option<Vec<String>>,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model,
            target_names,
            feature_names,
        }
    }

    /// Check the metadata against the fitted model.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        let forest = &self.model.classifier;
        if let Some(index) = forest
            .trees
            .iter()
            .position(|tree| !tree.is_well_formed(forest.n_features, forest.n_classes))
        {
            return Err(ArtifactError::MalformedTree { index });
        }
        if let Some(names) = &self.target_names
            && names.len() != self.model.n_classes()
        {
            return Err(ArtifactError::MetadataMismatch {
                field: "target_names",
                expected: self.model.n_classes(),
                found: names.len(),
            });
        }
        if let Some(names) = &self.feature_names
            && names.len() != self.model.n_features()
        {
            return Err(ArtifactError::MetadataMismatch {
                field: "feature_names",
                expected: self.model.n_features(),
                found: names.len(),
            });
        }
        Ok(())
    }

    /// Number of features every request row must carry.
    pub fn feature_count(&self) -> usize {
        self.feature_names
            .as_ref()
            .map(Vec::len)
            .unwrap_or_else(|| self.model.n_features())
    }

    /// Load and validate an artifact written by [`ModelArtifact::save_json`].
    pub fn load_json(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self =
            serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the artifact as pretty JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<(), ArtifactError> {
        let write_err = |source: std::io::Error| ArtifactError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(ArtifactError::Encode)?;
        std::fs::write(path, bytes).map_err(write_err)
    }
}
