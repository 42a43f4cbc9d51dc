//! Specialist templates
//!
//! A template is a relaxed-JSON file describing a persona, its prompt bundles
//! and the documentation it leans on. Enriched artifacts share the format.

mod error;
mod loader;
mod model;
mod prompt_id;
pub mod relaxed;

pub use error::LoadError;
pub use loader::{load_resolved, load_template, parse_template, resolve_template_path};
pub use model::{
    Capabilities, DocumentationRef, Enrichment, Persona, PromptBundle, PromptMap, PromptStrategy, Prompts,
    SubstitutionStyle, Template, VersionRecord,
};
pub use prompt_id::PromptId;
