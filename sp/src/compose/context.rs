//! Substitution context
//!
//! Variables are merged with increasing precedence: template defaults, then
//! extracted variables, then values derived from the request itself.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{TaskType, Variables};
use crate::downstream::ExecutionRequest;
use crate::template::{DocumentationRef, Template};

/// Keys always supplied by the request; never worth extracting
pub const CONTEXT_KEYS: [&str; 10] = [
    "user_request",
    "workspace",
    "tools",
    "has_tools",
    "target_model",
    "task_type",
    "template_name",
    "persona_role",
    "expertise",
    "documentation",
];

static VARIABLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(?:#(?:if|unless|each|with)\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .expect("variable reference regex is valid")
});

/// Variable names a prompt text refers to
pub fn referenced_variables(text: &str) -> BTreeSet<String> {
    VARIABLE_REF
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .filter(|name| !matches!(name.as_str(), "else" | "this"))
        .collect()
}

/// Names extraction may fill: declared defaults plus referenced names, request keys excluded
pub fn extractable_variables(template: &Template, prompt_text: &str) -> BTreeSet<String> {
    template
        .variables
        .keys()
        .cloned()
        .chain(referenced_variables(prompt_text))
        .filter(|name| !CONTEXT_KEYS.contains(&name.as_str()))
        .collect()
}

/// One documentation entry as rendered into the prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentationEntry {
    pub description: String,
    pub location: String,
    pub summary: String,
    pub key_concepts: Vec<String>,
    pub code_patterns: Vec<String>,
}

/// Enriched entries relevant to `task`
///
/// An entry qualifies when its relevant tasks include the task type. For the
/// general task, entries naming `general` or no task at all qualify.
pub fn qualifying_documentation(docs: &[DocumentationRef], task: TaskType) -> Vec<DocumentationEntry> {
    docs.iter()
        .filter_map(|doc| {
            let enrichment = doc.enrichment.as_ref()?;
            let tasks = &enrichment.relevant_tasks;
            let relevant = match task {
                TaskType::General => tasks.is_empty() || tasks.iter().any(|t| t == "general"),
                other => tasks.iter().any(|t| t == other.as_str()),
            };
            relevant.then(|| DocumentationEntry {
                description: doc.description.clone(),
                location: doc.location.clone(),
                summary: enrichment.summary.clone(),
                key_concepts: enrichment.key_concepts.clone(),
                code_patterns: enrichment.code_patterns.clone(),
            })
        })
        .collect()
}

/// Values known without asking a model
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    pub user_request: &'a str,
    pub request: &'a ExecutionRequest,
    pub template: &'a Template,
    pub target_model: Option<&'a str>,
}

impl RequestContext<'_> {
    fn to_map(&self, task: TaskType, documentation: &[DocumentationEntry]) -> Map<String, Value> {
        let tools: Vec<&str> = self.request.tools.iter().map(|t| t.name.as_str()).collect();
        let workspace = self
            .request
            .workspace
            .as_ref()
            .map(|w| w.display().to_string())
            .unwrap_or_default();

        let value = json!({
            "user_request": self.user_request,
            "workspace": workspace,
            "tools": tools,
            "has_tools": !tools.is_empty(),
            "target_model": self.target_model.unwrap_or_default(),
            "task_type": task.as_str(),
            "template_name": self.template.name,
            "persona_role": self.template.persona.role,
            "expertise": self.template.persona.expertise,
            "documentation": documentation,
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Template defaults, then extracted values, then request-derived values
    pub fn merge(&self, extracted: &Variables, task: TaskType, documentation: &[DocumentationEntry]) -> Value {
        let mut merged: Map<String, Value> = self
            .template
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        merged.extend(extracted.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.extend(self.to_map(task, documentation));
        Value::Object(merged)
    }
}
