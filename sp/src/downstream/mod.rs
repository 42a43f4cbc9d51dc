//! Downstream execution clients
//!
//! The composed request is forwarded to an [`ExecutionClient`]. The adapter
//! only reads its `name` (to find the active-model environment variable) and
//! calls `send`; anything that satisfies the trait can sit underneath,
//! including another adapter.

mod client;
mod dry_run;
mod error;
mod llm;
mod types;

pub use client::ExecutionClient;
pub use dry_run::DryRunClient;
pub use error::ClientError;
pub use llm::LlmExecutionClient;
pub use types::{ChatMessage, ChatRole, ExecutionRequest, ExecutionResponse};

#[cfg(test)]
pub use client::mock;
