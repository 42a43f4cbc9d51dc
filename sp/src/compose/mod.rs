//! Prompt composition
//!
//! Selection, variable extraction, documentation injection and the
//! adapter that ties them around a downstream client.

mod adapter;
mod context;
mod error;
mod extraction;
mod render;
mod selection;
mod static_path;
mod task;
mod telemetry;

use std::collections::BTreeMap;

pub use adapter::{Composed, PromptAdapter, PromptAdapterBuilder};
pub use context::{CONTEXT_KEYS, DocumentationEntry, RequestContext, extractable_variables, referenced_variables};
pub use error::{AdapterError, ComposeError, ExtractionError, SelectionError};
pub use extraction::{EXTRACT_TOOL, extract, parse_extraction};
pub use render::{RenderedPrompt, render_prompt};
pub use selection::{Confidence, SYSTEM_PROMPT_KEY, SelectionResult, candidates, parse_selection, select};
pub use static_path::{guess_task, static_prompt_id};
pub use task::TaskType;
pub use telemetry::{CacheOutcome, CallTelemetry, CompositionPath};

/// Variable name to value, as extracted or merged
pub type Variables = BTreeMap<String, serde_json::Value>;
