//! Artifact store error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Invalid version '{0}': expected MAJOR.MINOR.PATCH")]
    InvalidVersion(String),

    #[error("Invalid template path: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free sequence number in {} after {attempts} attempts", dir.display())]
    SequenceExhausted { dir: PathBuf, attempts: u32 },
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }
}
