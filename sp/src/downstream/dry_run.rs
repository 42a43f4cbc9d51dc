//! Client that answers without calling anything

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::{ClientError, ExecutionClient, ExecutionRequest, ExecutionResponse};

/// Echoes the request back as pretty JSON and keeps the last one
pub struct DryRunClient {
    name: String,
    last: Mutex<Option<ExecutionRequest>>,
}

impl DryRunClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<ExecutionRequest> {
        self.last.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl ExecutionClient for DryRunClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: ExecutionRequest) -> Result<ExecutionResponse, ClientError> {
        debug!(name = %self.name, "DryRunClient::send: called");
        let content = serde_json::to_string_pretty(&request).map_err(|e| ClientError::Other(e.to_string()))?;
        *self.last.lock().unwrap_or_else(|p| p.into_inner()) = Some(request);
        Ok(ExecutionResponse::text(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_echoes() {
        let client = DryRunClient::new("codex");
        let response = client.send(ExecutionRequest::from_user("ping")).await.unwrap();

        assert!(response.content.contains("\"ping\""));
        assert_eq!(client.name(), "codex");
        assert_eq!(client.last_request().unwrap().messages[0].content, "ping");
    }
}
