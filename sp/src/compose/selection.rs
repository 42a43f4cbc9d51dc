//! Model-assisted prompt selection

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SelectionError;
use crate::llm::{CompletionRequest, LlmClient, Message, extract_json_object};
use crate::prompts::PromptLoader;
use crate::template::{PromptId, Template};

/// Prompt key the adapter composes from
pub const SYSTEM_PROMPT_KEY: &str = "systemPrompt";

const SELECTION_MAX_TOKENS: u32 = 256;

/// Coarse certainty of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Unrecognized labels read as `Low`
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

/// The judgment model's pick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    pub selected_prompt_id: String,
    pub confidence: Confidence,
}

#[derive(Debug, Serialize)]
struct Candidate<'a> {
    id: String,
    text: &'a str,
}

/// Ids and texts offered to the judge, narrowed to the target model when known
pub fn candidates<'a>(template: &'a Template, target_model: Option<&str>) -> Vec<(PromptId, &'a str)> {
    template
        .prompt_ids(SYSTEM_PROMPT_KEY, target_model)
        .into_iter()
        .filter_map(|id| {
            let text = template.prompt_text(&id)?;
            Some((id, text))
        })
        .collect()
}

/// Ask the judge which prompt fits; the call races `timeout`
///
/// When the timer wins the call future is dropped, so a late answer is
/// never observed.
pub async fn select(
    judge: &dyn LlmClient,
    prompts: &PromptLoader,
    template: &Template,
    user_request: &str,
    target_model: Option<&str>,
    model: &str,
    timeout: Duration,
) -> Result<SelectionResult, SelectionError> {
    debug!(%model, ?target_model, "select: called");
    let candidates = candidates(template, target_model);
    if candidates.is_empty() {
        return Err(SelectionError::NoCandidates);
    }

    let rendered: Vec<Candidate<'_>> = candidates
        .iter()
        .map(|(id, text)| Candidate {
            id: id.to_string(),
            text: *text,
        })
        .collect();
    let prompt = prompts
        .render(
            "selection",
            &serde_json::json!({
                "user_request": user_request,
                "target_model": target_model,
                "candidates": rendered,
            }),
        )
        .map_err(|e| SelectionError::Prompt(e.to_string()))?;

    let request = CompletionRequest {
        messages: vec![Message::user(prompt)],
        model: Some(model.to_string()),
        max_tokens: SELECTION_MAX_TOKENS,
        ..CompletionRequest::default()
    };

    let response = tokio::time::timeout(timeout, judge.complete(request))
        .await
        .map_err(|_| SelectionError::Timeout(timeout))??;

    parse_selection(response.content.as_deref().unwrap_or_default())
}

/// Read `{selectedPromptId, confidence}` out of model text
///
/// Only the shape is checked; whether the id resolves is decided later.
pub fn parse_selection(text: &str) -> Result<SelectionResult, SelectionError> {
    let value = extract_json_object(text).ok_or_else(|| SelectionError::Parse("no JSON object in response".into()))?;

    let id = value
        .get("selectedPromptId")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SelectionError::Parse("missing selectedPromptId".into()))?;

    let confidence = match value.get("confidence").and_then(|v| v.as_str()) {
        Some(label) => Confidence::parse(label),
        None => {
            warn!("Selection response lacks confidence, assuming low");
            Confidence::Low
        }
    };

    Ok(SelectionResult {
        selected_prompt_id: id.to_string(),
        confidence,
    })
}
