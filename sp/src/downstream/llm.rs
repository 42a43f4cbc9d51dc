//! Downstream client backed by a judgment-model provider

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{ChatRole, ClientError, ExecutionClient, ExecutionRequest, ExecutionResponse};
use crate::llm::{CompletionRequest, LlmClient, Message};

const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Sends composed requests straight to an [`LlmClient`]
pub struct LlmExecutionClient {
    name: String,
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl LlmExecutionClient {
    pub fn new(name: impl Into<String>, client: Arc<dyn LlmClient>) -> Self {
        Self {
            name: name.into(),
            client,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// System messages become the system prompt; tool output is passed as user text
    fn to_completion(&self, request: ExecutionRequest) -> CompletionRequest {
        let mut system = Vec::new();
        let mut messages = Vec::new();
        for message in request.messages {
            match message.role {
                ChatRole::System => system.push(message.content),
                ChatRole::User => messages.push(Message::user(message.content)),
                ChatRole::Assistant => messages.push(Message::assistant(message.content)),
                ChatRole::Tool => messages.push(Message::user(format!("Tool output:\n{}", message.content))),
            }
        }

        CompletionRequest {
            system_prompt: system.join("\n\n"),
            messages,
            tools: request.tools,
            max_tokens: self.max_tokens,
            ..CompletionRequest::default()
        }
    }
}

#[async_trait]
impl ExecutionClient for LlmExecutionClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: ExecutionRequest) -> Result<ExecutionResponse, ClientError> {
        debug!(name = %self.name, messages = request.messages.len(), "LlmExecutionClient::send: called");
        let response = self.client.complete(self.to_completion(request)).await?;
        Ok(ExecutionResponse {
            content: response.content.unwrap_or_default(),
            tool_calls: response.tool_calls,
            usage: response.usage,
        })
    }
}
