//! Per-call telemetry

use serde::Serialize;

use super::{Confidence, TaskType};

/// How a cache-checked phase was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOutcome {
    Hit,
    Miss,
    /// Phase did not run
    Skipped,
    /// Phase ran and failed; nothing was cached
    Failed,
}

/// Which route produced the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionPath {
    ModelAssisted,
    /// Model-assisted failed and the static routine took over
    StaticFallback,
    /// Model assistance was disabled
    Static,
}

/// What one adapter call did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallTelemetry {
    pub template: String,
    pub path: CompositionPath,
    pub selected_prompt_id: String,
    pub confidence: Option<Confidence>,
    pub task_type: TaskType,
    pub selection_cache: CacheOutcome,
    pub extraction_cache: CacheOutcome,
    pub selection_ms: u64,
    pub extraction_ms: u64,
    pub downstream_ms: u64,
    pub variables_extracted: usize,
    pub documentation_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}
