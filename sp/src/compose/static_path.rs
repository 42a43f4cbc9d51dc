//! Deterministic prompt choice, no model involved

use tracing::debug;

use super::{ComposeError, SYSTEM_PROMPT_KEY, TaskType};
use crate::template::{PromptId, Template};

/// Task bundle whose keyword hints best match the request
///
/// Only allow-listed bundles compete; ties go to the first key in order.
pub fn guess_task(template: &Template, user_request: &str) -> Option<String> {
    let lowered = user_request.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for key in template.prompts.tasks.keys() {
        let Some(task) = TaskType::parse(key) else {
            continue;
        };
        let score = task.score(&lowered);
        if score > 0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((key.as_str(), score));
        }
    }
    debug!(?best, "guess_task: done");
    best.map(|(key, _)| key.to_string())
}

/// Pick a prompt id from keyword hints and the target model
pub fn static_prompt_id(
    template: &Template,
    user_request: &str,
    target_model: Option<&str>,
) -> Result<PromptId, ComposeError> {
    let key = SYSTEM_PROMPT_KEY.to_string();

    if let Some(task) = guess_task(template, user_request) {
        let mut ids = Vec::new();
        if let Some(model) = target_model {
            ids.push(PromptId::TaskModel {
                task: task.clone(),
                model: model.to_string(),
                key: key.clone(),
            });
        }
        ids.push(PromptId::TaskDefault {
            task,
            key: key.clone(),
        });
        if let Some(id) = ids.into_iter().find(|id| template.prompt_text(id).is_some()) {
            return Ok(id);
        }
        debug!("static_prompt_id: task scope has no system prompt, using global");
    }

    if let Some(model) = target_model {
        let id = PromptId::GlobalModel {
            model: model.to_string(),
            key: key.clone(),
        };
        if template.prompt_text(&id).is_some() {
            return Ok(id);
        }
    }

    let id = PromptId::GlobalDefault { key };
    match template.prompt_text(&id) {
        Some(_) => Ok(id),
        None => Err(ComposeError::PromptNotFound { id: id.to_string() }),
    }
}
