//! Template loading errors

use std::path::PathBuf;

use artifactstore::ArtifactError;
use thiserror::Error;

/// Errors raised while locating, reading or validating a template
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "Template not found: {} (template paths resolve relative to the project root, currently {})",
        path.display(),
        root.display()
    )]
    NotFound { path: PathBuf, root: PathBuf },

    #[error("Failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed template {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid template {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("Failed to scan enriched artifacts for {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
}

impl LoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::NotFound { path, .. }
            | LoadError::Read { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::Invalid { path, .. }
            | LoadError::Artifact { path, .. } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}
