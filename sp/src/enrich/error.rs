//! Enrichment error types

use std::path::PathBuf;
use std::time::Duration;

use artifactstore::ArtifactError;
use thiserror::Error;

use crate::llm::LlmError;
use crate::template::LoadError;

/// Failures that stop an enrichment run before an artifact is written
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Artifact store error for {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },

    #[error("Failed to serialize enriched template: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// One documentation entry could not be enriched; the run carries on
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to fetch {location}: {message}")]
    Fetch { location: String, message: String },

    #[error("HTTP {status} fetching {location}")]
    Status { location: String, status: u16 },

    #[error("Document {0} is empty")]
    Empty(String),

    #[error("Failed to build analysis prompt: {0}")]
    Prompt(String),

    #[error("Analysis call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Analysis timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Unparseable analysis response: {0}")]
    Parse(String),
}
