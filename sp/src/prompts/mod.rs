//! Judgment prompts
//!
//! Loads and renders `.pmt` prompt files for selection, extraction and
//! documentation analysis.
//!
//! Loading chain:
//! 1. `.specialist/prompts/{name}.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Prompts use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{OVERRIDE_DIR, PromptLoader};
