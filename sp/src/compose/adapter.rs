//! Prompt composition adapter
//!
//! Wraps a downstream [`ExecutionClient`]. Each call picks a prompt variant
//! (model-assisted when enabled, keyword-based otherwise or on failure),
//! fills its variables and injects the result as the system message before
//! delegating. The downstream response is returned untouched.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::context::{RequestContext, extractable_variables};
use super::extraction::extract;
use super::render::{RenderedPrompt, render_prompt};
use super::selection::{SelectionResult, select};
use super::static_path::static_prompt_id;
use super::telemetry::{CacheOutcome, CallTelemetry, CompositionPath};
use super::{AdapterError, ComposeError, Confidence, ExtractionError, SelectionError, Variables};
use crate::cache::{PromptCache, scoped_fingerprint};
use crate::config::{CompositionConfig, EnvOverrides, LlmConfig};
use crate::downstream::{ChatMessage, ClientError, ExecutionClient, ExecutionRequest, ExecutionResponse};
use crate::llm::{LlmClient, create_client};
use crate::prompts::PromptLoader;
use crate::template::{PromptId, Template, load_resolved};

/// Everything fixed once the template has been resolved
struct Resolved {
    path: PathBuf,
    template: Template,
    config: CompositionConfig,
    cache: Arc<PromptCache>,
    judge: Option<Arc<dyn LlmClient>>,
}

/// A composed system prompt, ready to inject
#[derive(Debug, Clone)]
pub struct Composed {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub telemetry: CallTelemetry,
}

struct Outcome {
    id: PromptId,
    rendered: RenderedPrompt,
    confidence: Option<Confidence>,
    selection_cache: CacheOutcome,
    extraction_cache: CacheOutcome,
    selection_ms: u64,
    extraction_ms: u64,
    variables_extracted: usize,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Builder for [`PromptAdapter`]
pub struct PromptAdapterBuilder {
    template_path: PathBuf,
    inner: Arc<dyn ExecutionClient>,
    judge: Option<Arc<dyn LlmClient>>,
    llm_config: Option<LlmConfig>,
    prompts: Option<PromptLoader>,
    env: Option<EnvOverrides>,
    cache: Option<Arc<PromptCache>>,
}

impl PromptAdapterBuilder {
    /// Judgment client to use for selection and extraction
    pub fn judge(mut self, judge: Arc<dyn LlmClient>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Build the judgment client from this config, switched to the resolved provider
    pub fn llm_config(mut self, config: LlmConfig) -> Self {
        self.llm_config = Some(config);
        self
    }

    pub fn prompts(mut self, prompts: PromptLoader) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Use this environment snapshot instead of reading the process environment
    pub fn env(mut self, env: EnvOverrides) -> Self {
        self.env = Some(env);
        self
    }

    /// Share a cache between adapters
    pub fn cache(mut self, cache: Arc<PromptCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> PromptAdapter {
        let env = self.env.unwrap_or_else(|| EnvOverrides::from_env(self.inner.name()));
        debug!(template = ?self.template_path, client = %self.inner.name(), ?env, "PromptAdapterBuilder::build: called");
        PromptAdapter {
            template_path: self.template_path,
            inner: self.inner,
            judge: self.judge,
            llm_config: self.llm_config,
            prompts: self.prompts.unwrap_or_default(),
            env,
            shared_cache: self.cache,
            resolved: OnceCell::new(),
            last_messages: Mutex::new(None),
            last_telemetry: Mutex::new(None),
            history: Mutex::new(Vec::new()),
        }
    }
}

/// Downstream client decorator that composes the system prompt
pub struct PromptAdapter {
    template_path: PathBuf,
    inner: Arc<dyn ExecutionClient>,
    judge: Option<Arc<dyn LlmClient>>,
    llm_config: Option<LlmConfig>,
    prompts: PromptLoader,
    env: EnvOverrides,
    shared_cache: Option<Arc<PromptCache>>,
    resolved: OnceCell<Resolved>,
    last_messages: Mutex<Option<Vec<ChatMessage>>>,
    last_telemetry: Mutex<Option<CallTelemetry>>,
    history: Mutex<Vec<CallTelemetry>>,
}

impl PromptAdapter {
    pub fn builder(template_path: impl Into<PathBuf>, inner: Arc<dyn ExecutionClient>) -> PromptAdapterBuilder {
        PromptAdapterBuilder {
            template_path: template_path.into(),
            inner,
            judge: None,
            llm_config: None,
            prompts: None,
            env: None,
            cache: None,
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// File actually loaded, once resolved
    pub fn resolved_path(&self) -> Option<&Path> {
        self.resolved.get().map(|r| r.path.as_path())
    }

    /// Effective settings, once resolved
    pub fn config(&self) -> Option<&CompositionConfig> {
        self.resolved.get().map(|r| &r.config)
    }

    /// Messages of the most recent composed call
    pub fn last_messages(&self) -> Option<Vec<ChatMessage>> {
        self.last_messages.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn last_telemetry(&self) -> Option<CallTelemetry> {
        self.last_telemetry.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Telemetry of every call so far, oldest first
    pub fn history(&self) -> Vec<CallTelemetry> {
        self.history.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn wrap(&self, source: ComposeError) -> AdapterError {
        AdapterError {
            adapter: self.inner.name().to_string(),
            template: self.template_path.display().to_string(),
            source,
        }
    }

    async fn resolve(&self) -> Result<&Resolved, AdapterError> {
        self.resolved
            .get_or_try_init(|| async {
                let (path, template) = load_resolved(&self.template_path)?;
                let base = self.llm_config.clone().unwrap_or_default();
                let config = CompositionConfig::layered_over(&self.env, &template.prompt_strategy, &base);
                let cache = self
                    .shared_cache
                    .clone()
                    .unwrap_or_else(|| Arc::new(PromptCache::new(config.cache_ttl)));
                let judge = self.judge.clone().or_else(|| self.build_judge(&config));
                info!(
                    template = %template.name,
                    path = %path.display(),
                    model_assisted = config.model_assisted,
                    target_model = ?config.target_model,
                    "Resolved specialist template"
                );
                Ok::<_, ComposeError>(Resolved {
                    path,
                    template,
                    config,
                    cache,
                    judge,
                })
            })
            .await
            .map_err(|e| self.wrap(e))
    }

    fn build_judge(&self, config: &CompositionConfig) -> Option<Arc<dyn LlmClient>> {
        if !config.model_assisted {
            return None;
        }
        let base = self.llm_config.as_ref()?;
        match create_client(&base.with_provider(&config.provider)) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, provider = %config.provider, "No judgment client, composition will be static");
                None
            }
        }
    }

    /// Compose the system prompt for `request` without delegating
    pub async fn compose(&self, request: &ExecutionRequest) -> Result<Composed, AdapterError> {
        debug!(messages = request.messages.len(), "PromptAdapter::compose: called");
        let user_request = request
            .last_user_content()
            .ok_or_else(|| self.wrap(ComposeError::NoUserContent))?;

        let resolved = self.resolve().await?;
        let config = &resolved.config;
        let ctx = RequestContext {
            user_request,
            request,
            template: &resolved.template,
            target_model: config.target_model.as_deref(),
        };

        let (outcome, path, fallback_reason) = if config.model_assisted {
            match self.model_assisted(resolved, &ctx).await {
                Ok(outcome) => (outcome, CompositionPath::ModelAssisted, None),
                Err(ComposeError::Selection(e)) if config.fallback_to_static => {
                    warn!(error = %e, template = %resolved.template.name, "Model-assisted selection failed, using static prompt");
                    let outcome = self.static_outcome(resolved, &ctx).map_err(|e| self.wrap(e))?;
                    (outcome, CompositionPath::StaticFallback, Some(e.to_string()))
                }
                Err(e) => return Err(self.wrap(e)),
            }
        } else {
            let outcome = self.static_outcome(resolved, &ctx).map_err(|e| self.wrap(e))?;
            (outcome, CompositionPath::Static, None)
        };

        let telemetry = CallTelemetry {
            template: resolved.template.name.clone(),
            path,
            selected_prompt_id: outcome.id.to_string(),
            confidence: outcome.confidence,
            task_type: outcome.rendered.task_type,
            selection_cache: outcome.selection_cache,
            extraction_cache: outcome.extraction_cache,
            selection_ms: outcome.selection_ms,
            extraction_ms: outcome.extraction_ms,
            downstream_ms: 0,
            variables_extracted: outcome.variables_extracted,
            documentation_entries: outcome.rendered.documentation_entries,
            fallback_reason,
        };
        let messages = request.with_system_prompt(&outcome.rendered.text);

        debug!(prompt_id = %telemetry.selected_prompt_id, ?path, "PromptAdapter::compose: done");
        Ok(Composed {
            system_prompt: outcome.rendered.text,
            messages,
            telemetry,
        })
    }

    /// Compose, delegate, and record telemetry
    pub async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResponse, AdapterError> {
        let composed = self.compose(&request).await?;
        let Composed {
            messages,
            mut telemetry,
            ..
        } = composed;

        *self.last_messages.lock().unwrap_or_else(|p| p.into_inner()) = Some(messages.clone());

        let start = Instant::now();
        let result = self
            .inner
            .send(ExecutionRequest {
                messages,
                tools: request.tools,
                workspace: request.workspace,
            })
            .await;
        telemetry.downstream_ms = elapsed_ms(start);

        *self.last_telemetry.lock().unwrap_or_else(|p| p.into_inner()) = Some(telemetry.clone());
        self.history.lock().unwrap_or_else(|p| p.into_inner()).push(telemetry);

        result.map_err(|e| self.wrap(ComposeError::Downstream(e)))
    }

    fn static_outcome(&self, resolved: &Resolved, ctx: &RequestContext<'_>) -> Result<Outcome, ComposeError> {
        let id = static_prompt_id(&resolved.template, ctx.user_request, ctx.target_model)?;
        let rendered = render_prompt(&self.prompts, ctx, &id, &Variables::new(), resolved.config.substitution)?;
        Ok(Outcome {
            id,
            rendered,
            confidence: None,
            selection_cache: CacheOutcome::Skipped,
            extraction_cache: CacheOutcome::Skipped,
            selection_ms: 0,
            extraction_ms: 0,
            variables_extracted: 0,
        })
    }

    async fn model_assisted(&self, resolved: &Resolved, ctx: &RequestContext<'_>) -> Result<Outcome, ComposeError> {
        let config = &resolved.config;
        let template = &resolved.template;

        // keys are scoped to the resolved template so a shared cache never
        // replays an id chosen for another template
        let scope = resolved.path.display().to_string();

        // selection
        let key = scoped_fingerprint(ctx.user_request, &scope);
        let start = Instant::now();
        let (selection, selection_cache) = match resolved.cache.selection.get(&key) {
            Some(hit) => {
                debug!(prompt_id = %hit.selected_prompt_id, "model_assisted: selection cache hit");
                (hit, CacheOutcome::Hit)
            }
            None => {
                let judge = resolved.judge.as_deref().ok_or(SelectionError::NoJudge)?;
                let result = select(
                    judge,
                    &self.prompts,
                    template,
                    ctx.user_request,
                    ctx.target_model,
                    &config.selection_model,
                    config.timeout,
                )
                .await?;
                (result, CacheOutcome::Miss)
            }
        };
        let selection_ms = elapsed_ms(start);

        let SelectionResult {
            selected_prompt_id,
            confidence,
        } = selection;
        let id = PromptId::parse(&selected_prompt_id)
            .filter(|id| template.prompt_text(id).is_some())
            .ok_or_else(|| ComposeError::PromptNotFound {
                id: selected_prompt_id.clone(),
            })?;
        if selection_cache == CacheOutcome::Miss {
            resolved.cache.selection.set(
                key,
                SelectionResult {
                    selected_prompt_id: selected_prompt_id.clone(),
                    confidence,
                },
            );
        }

        // extraction
        let prompt_text = template.prompt_text(&id).unwrap_or_default();
        let names = extractable_variables(template, prompt_text);
        let start = Instant::now();
        let (variables, extraction_cache) = if names.is_empty() {
            (Variables::new(), CacheOutcome::Skipped)
        } else {
            let key = scoped_fingerprint(ctx.user_request, &format!("{scope}#{selected_prompt_id}"));
            match resolved.cache.variables.get(&key) {
                Some(hit) => (hit, CacheOutcome::Hit),
                None => {
                    let result = match resolved.judge.as_deref() {
                        Some(judge) => {
                            extract(
                                judge,
                                &self.prompts,
                                ctx.user_request,
                                prompt_text,
                                &names,
                                &config.extraction_model,
                                config.timeout,
                            )
                            .await
                        }
                        None => Err(ExtractionError::NoJudge),
                    };
                    match result {
                        Ok(variables) => {
                            resolved.cache.variables.set(key, variables.clone());
                            (variables, CacheOutcome::Miss)
                        }
                        Err(e) => {
                            warn!(error = %e, prompt_id = %id, "Variable extraction failed, using template defaults");
                            (Variables::new(), CacheOutcome::Failed)
                        }
                    }
                }
            }
        };
        let extraction_ms = elapsed_ms(start);

        let rendered = render_prompt(&self.prompts, ctx, &id, &variables, config.substitution)?;
        Ok(Outcome {
            id,
            rendered,
            confidence: Some(confidence),
            selection_cache,
            extraction_cache,
            selection_ms,
            extraction_ms,
            variables_extracted: variables.len(),
        })
    }
}

#[async_trait]
impl ExecutionClient for PromptAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, request: ExecutionRequest) -> Result<ExecutionResponse, ClientError> {
        self.execute(request).await.map_err(ClientError::from)
    }
}
