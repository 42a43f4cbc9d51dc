//! ExecutionClient trait definition

use async_trait::async_trait;

use super::{ClientError, ExecutionRequest, ExecutionResponse};

/// A client the composed request is delegated to
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Client name; `{NAME}_MODEL` names its active model
    fn name(&self) -> &str;

    /// Execute one request
    async fn send(&self, request: ExecutionRequest) -> Result<ExecutionResponse, ClientError>;
}
