//! Prompt Loader
//!
//! Loads judgment prompts from override files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Directory, relative to the working directory, holding prompt overrides
pub const OVERRIDE_DIR: &str = ".specialist/prompts";

/// Loads and renders judgment prompts
#[derive(Clone)]
pub struct PromptLoader {
    /// Handlebars engine, HTML escaping off
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.specialist/prompts/`)
    user_dir: Option<PathBuf>,
}

impl std::fmt::Debug for PromptLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptLoader").field("user_dir", &self.user_dir).finish()
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

impl PromptLoader {
    /// Create a loader rooted at a working directory
    pub fn new(workdir: impl AsRef<Path>) -> Self {
        let user_dir = workdir.as_ref().join(OVERRIDE_DIR);
        let user_dir_exists = user_dir.is_dir();
        debug!(?user_dir, %user_dir_exists, "PromptLoader::new: called");

        Self {
            hbs: engine(),
            user_dir: user_dir_exists.then_some(user_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: engine(),
            user_dir: None,
        }
    }

    /// Load a prompt by name
    ///
    /// Checks `.specialist/prompts/{name}.pmt` first, then the embedded copy.
    pub fn load(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a named prompt with the given context
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        debug!(%name, "PromptLoader::render: called");
        let template = self.load(name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render prompt {}: {}", name, e))
    }

    /// Render arbitrary template text with the same engine
    pub fn render_text<T: Serialize>(&self, text: &str, context: &T) -> Result<String> {
        self.hbs
            .render_template(text, context)
            .map_err(|e| eyre!("Failed to render template text: {}", e))
    }
}

fn engine() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(handlebars::no_escape);
    hbs
}
