//! Prompt ids: dotted paths naming one prompt text inside a template
//!
//! Four shapes are recognized:
//!
//! - `default.<key>`
//! - `general.model_specific.<model>.<key>`
//! - `<task>.default.<key>`
//! - `<task>.model_specific.<model>.<key>`
//!
//! Model names may contain dots; the key is always the last segment.

use std::fmt;

use super::Template;

const DEFAULT: &str = "default";
const GENERAL: &str = "general";
const MODEL_SPECIFIC: &str = "model_specific";

/// A parsed prompt id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PromptId {
    GlobalDefault { key: String },
    GlobalModel { model: String, key: String },
    TaskDefault { task: String, key: String },
    TaskModel { task: String, model: String, key: String },
}

impl PromptId {
    /// Parse a dotted id; any other shape yields `None`
    pub fn parse(id: &str) -> Option<Self> {
        let segments: Vec<&str> = id.split('.').collect();
        if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let key = segments[segments.len() - 1].to_string();
        let model = || segments[2..segments.len() - 1].join(".");

        match (segments[0], segments[1], segments.len()) {
            (DEFAULT, k, 2) => Some(PromptId::GlobalDefault { key: k.to_string() }),
            (GENERAL, MODEL_SPECIFIC, n) if n >= 4 => Some(PromptId::GlobalModel { model: model(), key }),
            (DEFAULT | GENERAL, _, _) => None,
            (task, DEFAULT, 3) => Some(PromptId::TaskDefault {
                task: task.to_string(),
                key,
            }),
            (task, MODEL_SPECIFIC, n) if n >= 4 => Some(PromptId::TaskModel {
                task: task.to_string(),
                model: model(),
                key,
            }),
            _ => None,
        }
    }

    /// Task segment, `None` for global ids
    pub fn task(&self) -> Option<&str> {
        match self {
            PromptId::TaskDefault { task, .. } | PromptId::TaskModel { task, .. } => Some(task),
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            PromptId::GlobalModel { model, .. } | PromptId::TaskModel { model, .. } => Some(model),
            _ => None,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            PromptId::GlobalDefault { key }
            | PromptId::GlobalModel { key, .. }
            | PromptId::TaskDefault { key, .. }
            | PromptId::TaskModel { key, .. } => key,
        }
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptId::GlobalDefault { key } => write!(f, "{DEFAULT}.{key}"),
            PromptId::GlobalModel { model, key } => write!(f, "{GENERAL}.{MODEL_SPECIFIC}.{model}.{key}"),
            PromptId::TaskDefault { task, key } => write!(f, "{task}.{DEFAULT}.{key}"),
            PromptId::TaskModel { task, model, key } => write!(f, "{task}.{MODEL_SPECIFIC}.{model}.{key}"),
        }
    }
}

impl Template {
    /// Look up the prompt text an id names; `None` unless that exact path exists
    pub fn prompt_text(&self, id: &PromptId) -> Option<&str> {
        let prompts = &self.prompts;
        let text = match id {
            PromptId::GlobalDefault { key } => prompts.default.get(key),
            PromptId::GlobalModel { model, key } => prompts.model_specific.get(model)?.get(key),
            PromptId::TaskDefault { task, key } => prompts.tasks.get(task)?.default.get(key),
            PromptId::TaskModel { task, model, key } => prompts.tasks.get(task)?.model_specific.get(model)?.get(key),
        };
        text.map(String::as_str)
    }

    /// Every id carrying `key`, global bundle first, then tasks in key order
    ///
    /// With `model` set, model-specific entries for other models are left out.
    pub fn prompt_ids(&self, key: &str, model: Option<&str>) -> Vec<PromptId> {
        let keep_model = |m: &str| model.is_none_or(|target| target == m);
        let mut ids = Vec::new();

        if self.prompts.default.contains_key(key) {
            ids.push(PromptId::GlobalDefault { key: key.to_string() });
        }
        for (m, texts) in &self.prompts.model_specific {
            if keep_model(m) && texts.contains_key(key) {
                ids.push(PromptId::GlobalModel {
                    model: m.clone(),
                    key: key.to_string(),
                });
            }
        }
        for (task, bundle) in &self.prompts.tasks {
            if bundle.default.contains_key(key) {
                ids.push(PromptId::TaskDefault {
                    task: task.clone(),
                    key: key.to_string(),
                });
            }
            for (m, texts) in &bundle.model_specific {
                if keep_model(m) && texts.contains_key(key) {
                    ids.push(PromptId::TaskModel {
                        task: task.clone(),
                        model: m.clone(),
                        key: key.to_string(),
                    });
                }
            }
        }

        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        serde_json::from_value(serde_json::json!({
            "name": "ids",
            "prompts": {
                "default": { "systemPrompt": "global" },
                "modelSpecific": { "gpt-4.1": { "systemPrompt": "global gpt" } },
                "project_setup": {
                    "default": { "systemPrompt": "setup" },
                    "modelSpecific": {
                        "modelX": { "systemPrompt": "setup x" },
                        "modelY": { "systemPrompt": "setup y" }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_four_shapes() {
        assert_eq!(
            PromptId::parse("default.systemPrompt"),
            Some(PromptId::GlobalDefault {
                key: "systemPrompt".to_string()
            })
        );
        assert_eq!(
            PromptId::parse("general.model_specific.gpt-4.1.systemPrompt"),
            Some(PromptId::GlobalModel {
                model: "gpt-4.1".to_string(),
                key: "systemPrompt".to_string()
            })
        );
        assert_eq!(
            PromptId::parse("testing.default.systemPrompt"),
            Some(PromptId::TaskDefault {
                task: "testing".to_string(),
                key: "systemPrompt".to_string()
            })
        );
        assert_eq!(
            PromptId::parse("project_setup.model_specific.modelX.systemPrompt"),
            Some(PromptId::TaskModel {
                task: "project_setup".to_string(),
                model: "modelX".to_string(),
                key: "systemPrompt".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for bad in [
            "",
            "systemPrompt",
            "default",
            "default.a.b",
            "general.systemPrompt",
            "general.model_specific.systemPrompt",
            "testing.systemPrompt",
            "testing.other.systemPrompt",
            "testing.model_specific.systemPrompt",
            "a..b",
        ] {
            assert_eq!(PromptId::parse(bad), None, "{bad} should not parse");
        }
    }

    #[test]
    fn test_display_round_trip() {
        for id in [
            "default.systemPrompt",
            "general.model_specific.gpt-4.1.systemPrompt",
            "refactoring.default.userPrompt",
            "project_setup.model_specific.modelX.systemPrompt",
        ] {
            assert_eq!(PromptId::parse(id).unwrap().to_string(), id);
        }
    }

    #[test]
    fn test_prompt_text_requires_exact_path() {
        let t = template();
        let hit = PromptId::parse("project_setup.model_specific.modelX.systemPrompt").unwrap();
        assert_eq!(t.prompt_text(&hit), Some("setup x"));

        let miss_model = PromptId::parse("project_setup.model_specific.modelZ.systemPrompt").unwrap();
        assert_eq!(t.prompt_text(&miss_model), None);

        let miss_task = PromptId::parse("testing.model_specific.modelX.systemPrompt").unwrap();
        assert_eq!(t.prompt_text(&miss_task), None);

        let miss_key = PromptId::parse("project_setup.model_specific.modelX.userPrompt").unwrap();
        assert_eq!(t.prompt_text(&miss_key), None);

        let global_model = PromptId::parse("general.model_specific.gpt-4.1.systemPrompt").unwrap();
        assert_eq!(t.prompt_text(&global_model), Some("global gpt"));
    }

    #[test]
    fn test_prompt_ids_narrowed_by_model() {
        let t = template();
        let all = t.prompt_ids("systemPrompt", None);
        assert_eq!(all.len(), 5);

        let narrowed: Vec<String> = t
            .prompt_ids("systemPrompt", Some("modelX"))
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(
            narrowed,
            vec![
                "default.systemPrompt",
                "project_setup.default.systemPrompt",
                "project_setup.model_specific.modelX.systemPrompt",
            ]
        );
    }
}
