//! Model-assisted variable extraction
//!
//! The judge is forced to call one tool whose input schema lists the known
//! variable names. Only scalar values for known names survive.

use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::{ExtractionError, Variables};
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, Message, ToolDefinition, extract_json_object};
use crate::prompts::PromptLoader;

pub const EXTRACT_TOOL: &str = "extract_variables";

const EXTRACTION_MAX_TOKENS: u32 = 1024;

/// The forced tool; every known name is an optional scalar property
pub fn extraction_tool(names: &BTreeSet<String>) -> ToolDefinition {
    let properties: Map<String, Value> = names
        .iter()
        .map(|name| (name.clone(), json!({ "type": ["string", "number", "boolean"] })))
        .collect();

    ToolDefinition::new(
        EXTRACT_TOOL,
        "Report values for prompt template variables found in the user request",
        json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        }),
    )
}

/// Ask the judge to fill `names` from the request; the call races `timeout`
pub async fn extract(
    judge: &dyn LlmClient,
    prompts: &PromptLoader,
    user_request: &str,
    prompt_text: &str,
    names: &BTreeSet<String>,
    model: &str,
    timeout: Duration,
) -> Result<Variables, ExtractionError> {
    debug!(%model, variables = names.len(), "extract: called");
    let prompt = prompts
        .render(
            "extraction",
            &json!({
                "user_request": user_request,
                "prompt_text": prompt_text,
                "variables": names,
            }),
        )
        .map_err(|e| ExtractionError::Prompt(e.to_string()))?;

    let request = CompletionRequest {
        messages: vec![Message::user(prompt)],
        tools: vec![extraction_tool(names)],
        tool_choice: Some(EXTRACT_TOOL.to_string()),
        model: Some(model.to_string()),
        max_tokens: EXTRACTION_MAX_TOKENS,
        ..CompletionRequest::default()
    };

    let response = tokio::time::timeout(timeout, judge.complete(request))
        .await
        .map_err(|_| ExtractionError::Timeout(timeout))??;

    parse_extraction(&response, names)
}

/// Pull the tool input (or, failing that, a JSON object in the text) and validate it
pub fn parse_extraction(response: &CompletionResponse, names: &BTreeSet<String>) -> Result<Variables, ExtractionError> {
    let raw = response
        .tool_calls
        .iter()
        .find(|call| call.name == EXTRACT_TOOL)
        .map(|call| call.input.clone())
        .or_else(|| response.content.as_deref().and_then(extract_json_object))
        .ok_or_else(|| ExtractionError::Parse("no extract_variables call or JSON object".into()))?;

    let Value::Object(fields) = raw else {
        return Err(ExtractionError::Parse("tool input is not an object".into()));
    };

    let mut variables = Variables::new();
    for (name, value) in fields {
        if !names.contains(&name) {
            warn!(%name, "Discarding unknown extracted variable");
            continue;
        }
        match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                variables.insert(name, value);
            }
            other => warn!(%name, value = %other, "Discarding non-scalar extracted variable"),
        }
    }

    debug!(kept = variables.len(), "parse_extraction: done");
    Ok(variables)
}
