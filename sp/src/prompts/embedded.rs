//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Prompt-variant ranking prompt
pub const SELECTION: &str = include_str!("../../prompts/selection.pmt");

/// Variable extraction prompt
pub const EXTRACTION: &str = include_str!("../../prompts/extraction.pmt");

/// Documentation analysis prompt
pub const ENRICHMENT: &str = include_str!("../../prompts/enrichment.pmt");

/// Documentation section appended to composed system prompts
pub const DOCUMENTATION: &str = include_str!("../../prompts/documentation.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "selection" => Some(SELECTION),
        "extraction" => Some(EXTRACTION),
        "enrichment" => Some(ENRICHMENT),
        "documentation" => Some(DOCUMENTATION),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_selection() {
        let selection = get_embedded("selection").unwrap();
        assert!(selection.contains("selectedPromptId"));
        assert!(selection.contains("{{#each candidates}}"));
    }

    #[test]
    fn test_get_embedded_extraction_names_tool() {
        assert!(get_embedded("extraction").unwrap().contains("extract_variables"));
    }

    #[test]
    fn test_get_embedded_enrichment_fields() {
        let enrichment = get_embedded("enrichment").unwrap();
        for field in ["summary", "keyConcepts", "relevantTasks", "codePatterns"] {
            assert!(enrichment.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
