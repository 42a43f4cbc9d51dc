//! Request/response types for downstream execution

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::llm::{TokenUsage, ToolCall, ToolDefinition};

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// One role-tagged message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// What a caller hands to a downstream client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Ordered conversation
    pub messages: Vec<ChatMessage>,

    /// Tools the downstream model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Workspace the request operates on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
}

impl ExecutionRequest {
    /// A request holding a single user message
    pub fn from_user(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(text)],
            ..Self::default()
        }
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Text of the most recent non-empty user message
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .find(|c| !c.trim().is_empty())
    }

    /// Put `prompt` in the system slot: replace the first system message, else prepend
    pub fn with_system_prompt(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = self.messages.clone();
        match messages.iter_mut().find(|m| m.role == ChatRole::System) {
            Some(existing) => existing.content = prompt.to_string(),
            None => messages.insert(0, ChatMessage::system(prompt)),
        }
        messages
    }
}

/// What a downstream client returns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

impl ExecutionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_user_content_skips_blank() {
        let request = ExecutionRequest {
            messages: vec![
                ChatMessage::user("first"),
                ChatMessage::assistant("ok"),
                ChatMessage::user("second"),
                ChatMessage::user("   "),
            ],
            ..ExecutionRequest::default()
        };
        assert_eq!(request.last_user_content(), Some("second"));
    }

    #[test]
    fn test_last_user_content_none() {
        let request = ExecutionRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::assistant("hi")],
            ..ExecutionRequest::default()
        };
        assert_eq!(request.last_user_content(), None);
    }

    #[test]
    fn test_system_prompt_prepended() {
        let request = ExecutionRequest::from_user("hello");
        let messages = request.with_system_prompt("be brief");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system("be brief"));
        assert_eq!(messages[1], ChatMessage::user("hello"));
    }

    #[test]
    fn test_system_prompt_replaced() {
        let request = ExecutionRequest {
            messages: vec![ChatMessage::user("hello"), ChatMessage::system("old")],
            ..ExecutionRequest::default()
        };
        let messages = request.with_system_prompt("new");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], ChatMessage::system("new"));
        // the caller's request is untouched
        assert_eq!(request.messages[1].content, "old");
    }
}
