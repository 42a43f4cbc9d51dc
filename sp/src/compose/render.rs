//! Final prompt text: selected prompt, documentation section, substitution

use tracing::debug;

use super::context::{RequestContext, qualifying_documentation};
use super::{ComposeError, TaskType, Variables};
use crate::prompts::PromptLoader;
use crate::template::{PromptId, SubstitutionStyle};

/// A composed system prompt and what went into it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    pub text: String,
    pub task_type: TaskType,
    pub documentation_entries: usize,
}

/// Resolve `id`, attach qualifying documentation and substitute variables
pub fn render_prompt(
    prompts: &PromptLoader,
    ctx: &RequestContext<'_>,
    id: &PromptId,
    extracted: &Variables,
    substitution: SubstitutionStyle,
) -> Result<RenderedPrompt, ComposeError> {
    debug!(%id, ?substitution, "render_prompt: called");
    let text = ctx
        .template
        .prompt_text(id)
        .ok_or_else(|| ComposeError::PromptNotFound { id: id.to_string() })?;

    let task_type = TaskType::from_prompt_id(id);
    let documentation = qualifying_documentation(&ctx.template.documentation, task_type);
    let variables = ctx.merge(extracted, task_type, &documentation);

    let section = if documentation.is_empty() {
        None
    } else {
        Some(prompts.load("documentation").map_err(|e| ComposeError::Render(e.to_string()))?)
    };

    let rendered = match substitution {
        SubstitutionStyle::Handlebars => {
            let combined = match section {
                Some(section) => format!("{text}{section}"),
                None => text.to_string(),
            };
            prompts
                .render_text(&combined, &variables)
                .map_err(|e| ComposeError::Render(e.to_string()))?
        }
        SubstitutionStyle::None => {
            let docs = match section {
                Some(section) => prompts
                    .render_text(&section, &variables)
                    .map_err(|e| ComposeError::Render(e.to_string()))?,
                None => String::new(),
            };
            format!("{text}{docs}")
        }
    };

    Ok(RenderedPrompt {
        text: rendered,
        task_type,
        documentation_entries: documentation.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downstream::ExecutionRequest;
    use crate::template::Template;
    use serde_json::json;

    fn template(docs: serde_json::Value) -> Template {
        serde_json::from_value(json!({
            "name": "rust-specialist",
            "persona": { "role": "Rust mentor", "expertise": ["tokio", "serde"] },
            "variables": { "project_name": "demo" },
            "documentation": docs,
            "prompts": {
                "default": {
                    "systemPrompt": "You are a {{persona_role}} for {{project_name}}.{{#if has_tools}} Tools: {{#each tools}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}.{{/if}}"
                },
                "testing": { "default": { "systemPrompt": "Test {{project_name}} & keep <it> green." } }
            }
        }))
        .unwrap()
    }

    fn enriched(tasks: &[&str]) -> serde_json::Value {
        json!({
            "type": "url",
            "location": "https://docs.rs/tokio",
            "description": "Tokio docs",
            "enrichment": {
                "summary": "Async runtime.",
                "keyConcepts": ["tasks", "timers"],
                "relevantTasks": tasks,
                "enrichedAt": "2025-01-01T00:00:00Z",
                "enrichmentModel": "m"
            }
        })
    }

    fn render(template: &Template, request: &ExecutionRequest, id: &str, style: SubstitutionStyle) -> RenderedPrompt {
        let ctx = RequestContext {
            user_request: "make tests pass",
            request,
            template,
            target_model: None,
        };
        render_prompt(
            &PromptLoader::embedded_only(),
            &ctx,
            &PromptId::parse(id).unwrap(),
            &Variables::new(),
            style,
        )
        .unwrap()
    }

    #[test]
    fn test_substitution_with_sections() {
        let t = template(json!([]));
        let request = ExecutionRequest::from_user("hi").with_tools(vec![
            crate::llm::ToolDefinition::new("bash", "", json!({})),
            crate::llm::ToolDefinition::new("edit", "", json!({})),
        ]);
        let out = render(&t, &request, "default.systemPrompt", SubstitutionStyle::Handlebars);
        assert_eq!(out.text, "You are a Rust mentor for demo. Tools: bash, edit.");
        assert_eq!(out.task_type, TaskType::General);
    }

    #[test]
    fn test_no_html_escaping() {
        let t = template(json!([]));
        let out = render(
            &t,
            &ExecutionRequest::from_user("hi"),
            "testing.default.systemPrompt",
            SubstitutionStyle::Handlebars,
        );
        assert_eq!(out.text, "Test demo & keep <it> green.");
    }

    #[test]
    fn test_documentation_section_only_when_qualifying() {
        let t = template(json!([enriched(&["testing"])]));
        let request = ExecutionRequest::from_user("hi");

        let testing = render(&t, &request, "testing.default.systemPrompt", SubstitutionStyle::Handlebars);
        assert_eq!(testing.documentation_entries, 1);
        assert!(testing.text.contains("## Reference documentation"));
        assert!(testing.text.contains("### Tokio docs"));
        assert!(testing.text.contains("Key concepts: tasks, timers"));

        let general = render(&t, &request, "default.systemPrompt", SubstitutionStyle::Handlebars);
        assert_eq!(general.documentation_entries, 0);
        assert!(!general.text.contains("Reference documentation"));
    }

    #[test]
    fn test_verbatim_style_keeps_placeholders() {
        let t = template(json!([enriched(&["testing"])]));
        let out = render(
            &t,
            &ExecutionRequest::from_user("hi"),
            "testing.default.systemPrompt",
            SubstitutionStyle::None,
        );
        assert!(out.text.starts_with("Test {{project_name}} & keep <it> green."));
        assert!(out.text.contains("### Tokio docs"));
    }

    #[test]
    fn test_unknown_id_not_found() {
        let t = template(json!([]));
        let request = ExecutionRequest::from_user("hi");
        let ctx = RequestContext {
            user_request: "x",
            request: &request,
            template: &t,
            target_model: None,
        };
        let err = render_prompt(
            &PromptLoader::embedded_only(),
            &ctx,
            &PromptId::parse("project_setup.model_specific.modelX.systemPrompt").unwrap(),
            &Variables::new(),
            SubstitutionStyle::Handlebars,
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::PromptNotFound { .. }));
    }
}
