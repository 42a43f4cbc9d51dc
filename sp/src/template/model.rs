//! Template data model
//!
//! Field names follow the on-disk camelCase format. Fields this crate does not
//! know about are carried in `extra` so enrichment never drops them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prompt texts keyed by prompt key (e.g. `systemPrompt`)
pub type PromptMap = BTreeMap<String, String>;

fn default_version() -> String {
    "0.0.1".to_string()
}

fn default_doc_type() -> String {
    "url".to_string()
}

/// Root configuration artifact describing one specialist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub persona: Persona,

    #[serde(default)]
    pub capabilities: Capabilities,

    /// Declared defaults for substitution variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, Value>,

    #[serde(default)]
    pub documentation: Vec<DocumentationRef>,

    pub prompts: Prompts,

    #[serde(default)]
    pub prompt_strategy: PromptStrategy,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_history: Vec<VersionRecord>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Template {
    /// Task types this template carries bundles for
    pub fn task_types(&self) -> Vec<&str> {
        self.prompts.tasks.keys().map(String::as_str).collect()
    }
}

/// Who the specialist is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub expertise: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Capability tags; also accepted as a bare array of tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CapabilitiesRepr")]
pub struct Capabilities {
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub tech_stack: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CapabilitiesRepr {
    Tags(Vec<String>),
    Full {
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default, rename = "techStack")]
        tech_stack: Vec<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<CapabilitiesRepr> for Capabilities {
    fn from(repr: CapabilitiesRepr) -> Self {
        match repr {
            CapabilitiesRepr::Tags(tags) => Self {
                tags,
                ..Default::default()
            },
            CapabilitiesRepr::Full {
                tags,
                tech_stack,
                extra,
            } => Self {
                tags,
                tech_stack,
                extra,
            },
        }
    }
}

/// A documentation reference, optionally carrying enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationRef {
    #[serde(rename = "type", default = "default_doc_type")]
    pub doc_type: String,

    pub location: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentationRef {
    pub fn is_enriched(&self) -> bool {
        self.enrichment.is_some()
    }
}

/// Model-generated metadata attached to a documentation reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    pub summary: String,

    #[serde(default)]
    pub key_concepts: Vec<String>,

    #[serde(default)]
    pub relevant_tasks: Vec<String>,

    #[serde(default)]
    pub relevant_tech_stack: Vec<String>,

    #[serde(default)]
    pub relevant_tags: Vec<String>,

    #[serde(default)]
    pub code_patterns: Vec<String>,

    pub enriched_at: DateTime<Utc>,

    pub enrichment_model: String,
}

/// All prompt bundles of a template
///
/// `default` and `modelSpecific` are the global bundle; every other key is a
/// task bundle, which must itself expose `default`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompts {
    pub default: PromptMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub model_specific: BTreeMap<String, PromptMap>,

    #[serde(flatten)]
    pub tasks: BTreeMap<String, PromptBundle>,
}

/// Prompts for one task type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptBundle {
    pub default: PromptMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub model_specific: BTreeMap<String, PromptMap>,
}

/// How variables are substituted into prompt text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstitutionStyle {
    /// `{{var}}`, `{{#if}}`, `{{#each}}` with `@last`
    #[default]
    Handlebars,
    /// Prompt text is used verbatim
    None,
}

/// Template-declared composition settings; unset fields fall through to defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_to_static: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_assisted: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<SubstitutionStyle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_ms: Option<u64>,
}

/// One entry of an artifact's version history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub version: String,
    pub sequence: u32,
    pub created_at: DateTime<Utc>,
    pub source_path: String,
    pub provider: String,
    pub model: String,
    pub documents_enriched: usize,
    pub documents_skipped: usize,
    pub errors: usize,
}
