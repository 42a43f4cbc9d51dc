//! Composition error types

use std::time::Duration;

use thiserror::Error;

use crate::downstream::ClientError;
use crate::llm::LlmError;
use crate::template::LoadError;

/// Model-assisted selection failed; recoverable through the static routine
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Selection timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Selection call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Unparseable selection response: {0}")]
    Parse(String),

    #[error("Failed to build selection prompt: {0}")]
    Prompt(String),

    #[error("Template has no candidate prompts")]
    NoCandidates,

    #[error("No judgment model configured")]
    NoJudge,
}

/// Variable extraction failed; always degrades to an empty variable set
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Extraction call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Unparseable extraction response: {0}")]
    Parse(String),

    #[error("Failed to build extraction prompt: {0}")]
    Prompt(String),

    #[error("No judgment model configured")]
    NoJudge,
}

/// Errors that abort a composed call
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Request has no user message content")]
    NoUserContent,

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Prompt not found: {id}")]
    PromptNotFound { id: String },

    #[error("Failed to render prompt: {0}")]
    Render(String),

    #[error("Downstream client failed: {0}")]
    Downstream(#[source] ClientError),
}

/// A fatal composition error tagged with the adapter and template it came from
#[derive(Debug, Error)]
#[error("[{adapter}] {template}: {source}")]
pub struct AdapterError {
    pub adapter: String,
    pub template: String,
    #[source]
    pub source: ComposeError,
}

impl AdapterError {
    pub fn is_prompt_not_found(&self) -> bool {
        matches!(self.source, ComposeError::PromptNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_error_names_identity() {
        let err = AdapterError {
            adapter: "claude".to_string(),
            template: "specialists/rust.json".to_string(),
            source: ComposeError::PromptNotFound {
                id: "testing.model_specific.x.systemPrompt".to_string(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("[claude]"));
        assert!(text.contains("specialists/rust.json"));
        assert!(text.contains("testing.model_specific.x.systemPrompt"));
        assert!(err.is_prompt_not_found());
    }

    #[test]
    fn test_timeout_is_ordinary_selection_error() {
        let err = SelectionError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Selection timed out after 250ms");
    }
}
