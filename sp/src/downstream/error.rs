//! Downstream client errors

use thiserror::Error;

use crate::compose::AdapterError;
use crate::llm::LlmError;

/// Errors a downstream client can return from `send`
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// A nested prompt adapter failed
    #[error(transparent)]
    Adapter(Box<AdapterError>),

    #[error("{0}")]
    Other(String),
}

impl From<AdapterError> for ClientError {
    fn from(err: AdapterError) -> Self {
        ClientError::Adapter(Box::new(err))
    }
}
