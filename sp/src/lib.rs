//! Specialist - dynamic prompt composition for agent benchmarks
//!
//! A specialist template carries prompt variants per task type and model.
//! [`PromptAdapter`] wraps a downstream client and, on every call, picks the
//! variant that fits the request, fills its variables and injects it as the
//! system message. The [`Enricher`] mints new template versions with
//! model-generated metadata about the documentation a template references.
//!
//! # Modules
//!
//! - [`template`] - template model, loading and version resolution
//! - [`compose`] - selection, extraction and the prompt adapter
//! - [`cache`] - TTL caches for judgment results
//! - [`llm`] - judgment-model clients
//! - [`downstream`] - the client contract the adapter wraps
//! - [`enrich`] - documentation enrichment
//! - [`prompts`] - judgment prompt templates
//! - [`config`] - file and environment configuration
//! - [`cli`] - command-line interface

pub mod cache;
pub mod cli;
pub mod compose;
pub mod config;
pub mod downstream;
pub mod enrich;
pub mod llm;
pub mod prompts;
pub mod template;

// Re-export commonly used types
pub use cache::PromptCache;
pub use compose::{
    AdapterError, CallTelemetry, ComposeError, Composed, CompositionPath, PromptAdapter, PromptAdapterBuilder,
};
pub use config::{CompositionConfig, Config, EnvOverrides, LlmConfig};
pub use downstream::{
    ChatMessage, ChatRole, ClientError, DryRunClient, ExecutionClient, ExecutionRequest, ExecutionResponse,
    LlmExecutionClient,
};
pub use enrich::{EnrichOptions, Enricher, EnrichmentReport, HttpFileFetcher};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client};
pub use prompts::PromptLoader;
pub use template::{LoadError, PromptId, Template, load_resolved, resolve_template_path};
