//! Enrichment engine
//!
//! Mints a new artifact at the next patch version with model-generated
//! metadata attached to each documentation entry. The newest existing
//! artifact is the source, so runs build on each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use artifactstore::{ArtifactStore, Version};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::fetch::{DocumentFetcher, MAX_DOCUMENT_CHARS, truncate_document};
use super::{DocumentError, EnrichError};
use crate::config::{DEFAULT_ENRICH_CONCURRENCY, DEFAULT_PROVIDER};
use crate::llm::{CompletionRequest, LlmClient, Message, extract_json_object};
use crate::prompts::PromptLoader;
use crate::template::{DocumentationRef, Enrichment, Template, VersionRecord, load_resolved};

const ANALYSIS_MAX_TOKENS: u32 = 2048;

/// Default per-document budget, fetch plus analysis
pub const DEFAULT_DOCUMENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Knobs for one enrichment run
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Provider recorded in the version history
    pub provider: String,
    /// Model override; the client's own model otherwise
    pub model: Option<String>,
    /// Re-enrich entries that already carry enrichment
    pub force: bool,
    pub timeout: Duration,
    /// Documents analysed concurrently per batch
    pub concurrency: usize,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            force: false,
            timeout: DEFAULT_DOCUMENT_TIMEOUT,
            concurrency: DEFAULT_ENRICH_CONCURRENCY,
        }
    }
}

/// A documentation entry that could not be enriched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentFailure {
    pub index: usize,
    pub location: String,
    pub message: String,
}

/// Outcome of an enrichment run
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    /// Artifact written by this run
    pub path: PathBuf,
    /// Template or artifact the run started from
    pub source: PathBuf,
    pub version: String,
    pub sequence: u32,
    pub documents_enriched: usize,
    pub documents_skipped: usize,
    pub errors: Vec<EnrichmentFailure>,
}

impl EnrichmentReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Controlled vocabulary for the relevance fields
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub task_types: Vec<String>,
    pub tech_stack: Vec<String>,
    pub tags: Vec<String>,
}

impl Vocabulary {
    pub fn from_template(template: &Template) -> Self {
        Self {
            task_types: template.task_types().into_iter().map(str::to_string).collect(),
            tech_stack: template.capabilities.tech_stack.clone(),
            tags: template.capabilities.tags.clone(),
        }
    }
}

/// Keep values found in `allowed` (case-insensitively), spelled as declared
fn constrain(values: Vec<String>, allowed: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for value in values {
        let Some(canonical) = allowed.iter().find(|a| a.eq_ignore_ascii_case(&value)) else {
            debug!(%value, "constrain: dropping value outside vocabulary");
            continue;
        };
        if !kept.contains(canonical) {
            kept.push(canonical.clone());
        }
    }
    kept
}

/// Turn model text into an [`Enrichment`]; relevance fields are constrained to `vocabulary`
pub fn parse_enrichment(text: &str, vocabulary: &Vocabulary, model: &str) -> Result<Enrichment, DocumentError> {
    let value = extract_json_object(text).ok_or_else(|| DocumentError::Parse("no JSON object in response".to_string()))?;

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DocumentError::Parse("missing summary".to_string()))?
        .to_string();

    let strings = |key: &str| -> Vec<String> {
        value
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    Ok(Enrichment {
        summary,
        key_concepts: strings("keyConcepts"),
        relevant_tasks: constrain(strings("relevantTasks"), &vocabulary.task_types),
        relevant_tech_stack: constrain(strings("relevantTechStack"), &vocabulary.tech_stack),
        relevant_tags: constrain(strings("relevantTags"), &vocabulary.tags),
        code_patterns: strings("codePatterns"),
        enriched_at: Utc::now(),
        enrichment_model: model.to_string(),
    })
}

/// Shared, read-only inputs of one run
struct RunContext<'a> {
    base_dir: &'a Path,
    vocabulary: &'a Vocabulary,
    model: &'a str,
    options: &'a EnrichOptions,
}

/// Batch documentation enricher
pub struct Enricher {
    judge: Arc<dyn LlmClient>,
    fetcher: Arc<dyn DocumentFetcher>,
    prompts: PromptLoader,
}

impl Enricher {
    pub fn new(judge: Arc<dyn LlmClient>, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        debug!(model = %judge.model(), "Enricher::new: called");
        Self {
            judge,
            fetcher,
            prompts: PromptLoader::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptLoader) -> Self {
        self.prompts = prompts;
        self
    }

    /// Enrich the template at `template_path` and write a new artifact
    ///
    /// Per-document failures are collected in the report; the artifact is
    /// written regardless.
    pub async fn enrich(&self, template_path: &Path, options: &EnrichOptions) -> Result<EnrichmentReport, EnrichError> {
        debug!(?template_path, ?options, "Enricher::enrich: called");
        let artifact_err = |source| EnrichError::Artifact {
            path: template_path.to_path_buf(),
            source,
        };

        let (source_path, template) = load_resolved(template_path)?;
        let store = ArtifactStore::for_template(template_path).map_err(artifact_err)?;
        let version = template.version.parse::<Version>().map_err(artifact_err)?.bump_patch();
        let vocabulary = Vocabulary::from_template(&template);
        let model = options.model.clone().unwrap_or_else(|| self.judge.model().to_string());

        info!(
            template = %template.name,
            source = %source_path.display(),
            %version,
            documents = template.documentation.len(),
            "Starting enrichment"
        );

        let pending: Vec<usize> = template
            .documentation
            .iter()
            .enumerate()
            .filter(|(_, doc)| options.force || !doc.is_enriched())
            .map(|(index, _)| index)
            .collect();
        let documents_skipped = template.documentation.len() - pending.len();

        let ctx = RunContext {
            base_dir: store.template_dir(),
            vocabulary: &vocabulary,
            model: &model,
            options,
        };

        let mut documentation = template.documentation.clone();
        let mut documents_enriched = 0;
        let mut errors = Vec::new();

        for batch in pending.chunks(options.concurrency.max(1)) {
            debug!(?batch, "Enricher::enrich: starting batch");
            let analyses = batch.iter().map(|&index| {
                let doc = &template.documentation[index];
                let ctx = &ctx;
                async move { (index, self.enrich_document(doc, ctx).await) }
            });

            for (index, result) in join_all(analyses).await {
                let doc = &mut documentation[index];
                match result {
                    Ok(enrichment) => {
                        info!(index, location = %doc.location, "Enriched document");
                        doc.enrichment = Some(enrichment);
                        documents_enriched += 1;
                    }
                    Err(e) => {
                        warn!(index, location = %doc.location, error = %e, "Document enrichment failed, keeping entry as is");
                        errors.push(EnrichmentFailure {
                            index,
                            location: doc.location.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        let mut output = template.clone();
        output.version = version.to_string();
        output.documentation = documentation;
        output.version_history.push(VersionRecord {
            version: version.to_string(),
            sequence: 0,
            created_at: Utc::now(),
            source_path: source_path.display().to_string(),
            provider: options.provider.clone(),
            model,
            documents_enriched,
            documents_skipped,
            errors: errors.len(),
        });

        let mut value = serde_json::to_value(&output)?;
        let written = store
            .write_next(&version, |sequence| {
                if let Some(record) = value
                    .get_mut("versionHistory")
                    .and_then(Value::as_array_mut)
                    .and_then(|history| history.last_mut())
                {
                    record["sequence"] = json!(sequence);
                }
                format!("{:#}\n", value).into_bytes()
            })
            .map_err(artifact_err)?;

        info!(
            path = %written.path.display(),
            documents_enriched,
            documents_skipped,
            errors = errors.len(),
            "Wrote enriched artifact"
        );

        Ok(EnrichmentReport {
            path: written.path,
            source: source_path,
            version: written.version.to_string(),
            sequence: written.sequence,
            documents_enriched,
            documents_skipped,
            errors,
        })
    }

    async fn enrich_document(&self, doc: &DocumentationRef, ctx: &RunContext<'_>) -> Result<Enrichment, DocumentError> {
        let timeout = ctx.options.timeout;
        tokio::time::timeout(timeout, self.analyze(doc, ctx))
            .await
            .map_err(|_| DocumentError::Timeout(timeout))?
    }

    async fn analyze(&self, doc: &DocumentationRef, ctx: &RunContext<'_>) -> Result<Enrichment, DocumentError> {
        debug!(location = %doc.location, "Enricher::analyze: called");
        let content = self.fetcher.fetch(doc, ctx.base_dir).await?;
        let content = truncate_document(&content, MAX_DOCUMENT_CHARS);

        let prompt = self
            .prompts
            .render(
                "enrichment",
                &json!({
                    "description": doc.description,
                    "location": doc.location,
                    "content": content,
                    "task_types": ctx.vocabulary.task_types,
                    "tech_stack": ctx.vocabulary.tech_stack,
                    "tags": ctx.vocabulary.tags,
                }),
            )
            .map_err(|e| DocumentError::Prompt(e.to_string()))?;

        let request = CompletionRequest {
            messages: vec![Message::user(prompt)],
            model: ctx.options.model.clone(),
            max_tokens: ANALYSIS_MAX_TOKENS,
            ..CompletionRequest::default()
        };
        let response = self.judge.complete(request).await?;

        parse_enrichment(response.content.as_deref().unwrap_or_default(), ctx.vocabulary, ctx.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;
    use crate::template::load_template;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Serves `content of <location>`; locations containing "broken" fail
    struct StubFetcher {
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DocumentFetcher for StubFetcher {
        async fn fetch(&self, doc: &DocumentationRef, _base_dir: &Path) -> Result<String, DocumentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if doc.location.contains("broken") {
                return Err(DocumentError::Status {
                    location: doc.location.clone(),
                    status: 500,
                });
            }
            Ok(format!("content of {}", doc.location))
        }
    }

    /// Holds each fetch open briefly and records the most fetches in flight
    struct PeakFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl DocumentFetcher for PeakFetcher {
        async fn fetch(&self, doc: &DocumentationRef, _base_dir: &Path) -> Result<String, DocumentError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("content of {}", doc.location))
        }
    }

    fn analysis() -> CompletionResponse {
        CompletionResponse::text(
            json!({
                "summary": "How tokio schedules tasks.",
                "keyConcepts": ["tasks", "runtime"],
                "relevantTasks": ["Testing", "astrology"],
                "relevantTechStack": ["tokio", "django"],
                "relevantTags": ["async"],
                "codePatterns": ["#[tokio::test]"]
            })
            .to_string(),
        )
    }

    fn write_template(dir: &Path, docs: Value) -> PathBuf {
        let path = dir.join("rust.json");
        let template = json!({
            "name": "rust-specialist",
            "version": "0.0.1",
            "owner": "bench-team",
            "capabilities": { "tags": ["async"], "techStack": ["tokio"] },
            "documentation": docs,
            "prompts": {
                "default": { "systemPrompt": "general" },
                "testing": { "default": { "systemPrompt": "tests" } }
            }
        });
        std::fs::write(&path, serde_json::to_string_pretty(&template).unwrap()).unwrap();
        path
    }

    fn doc(location: &str) -> Value {
        json!({ "type": "url", "location": location, "description": format!("doc {location}") })
    }

    fn enriched_doc(location: &str) -> Value {
        json!({
            "type": "url",
            "location": location,
            "description": "already done",
            "enrichment": {
                "summary": "Old summary.",
                "keyConcepts": ["a"],
                "relevantTasks": ["testing"],
                "relevantTechStack": [],
                "relevantTags": [],
                "codePatterns": [],
                "enrichedAt": "2025-01-01T00:00:00Z",
                "enrichmentModel": "old-model"
            }
        })
    }

    fn options() -> EnrichOptions {
        EnrichOptions {
            timeout: Duration::from_secs(5),
            ..EnrichOptions::default()
        }
    }

    #[tokio::test]
    async fn test_fully_enriched_template_makes_no_calls() {
        let dir = TempDir::new().unwrap();
        let path = write_template(dir.path(), json!([enriched_doc("https://a"), enriched_doc("https://b")]));
        let judge = Arc::new(MockLlmClient::new(vec![]));
        let fetcher = StubFetcher::new();
        let enricher = Enricher::new(judge.clone(), fetcher.clone());

        let report = enricher.enrich(&path, &options()).await.unwrap();

        assert_eq!(judge.call_count(), 0);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.documents_enriched, 0);
        assert_eq!(report.documents_skipped, 2);
        assert_eq!(report.version, "0.0.2");
        assert_eq!(report.sequence, 1);
        assert!(report.path.ends_with("enriched/0.0.2/rust.enriched.001.json"));

        let source = load_template(&path).unwrap();
        let mut written = load_template(&report.path).unwrap();
        assert_eq!(written.version_history.len(), 1);
        assert_eq!(written.version_history[0].sequence, 1);
        assert_eq!(written.version_history[0].documents_skipped, 2);
        written.version = source.version.clone();
        written.version_history = source.version_history.clone();
        assert_eq!(written, source);
    }

    #[tokio::test]
    async fn test_runs_build_on_previous_artifact() {
        let dir = TempDir::new().unwrap();
        let path = write_template(dir.path(), json!([enriched_doc("https://a")]));
        let enricher = Enricher::new(Arc::new(MockLlmClient::new(vec![])), StubFetcher::new());

        let first = enricher.enrich(&path, &options()).await.unwrap();
        let second = enricher.enrich(&path, &options()).await.unwrap();

        assert_eq!(first.version, "0.0.2");
        assert_eq!(second.version, "0.0.3");
        assert_eq!(second.sequence, 1);
        assert_eq!(second.source, first.path);
        assert!(first.path.exists());

        let written = load_template(&second.path).unwrap();
        let versions: Vec<&str> = written.version_history.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["0.0.2", "0.0.3"]);
    }

    #[tokio::test]
    async fn test_one_failure_in_five_is_isolated() {
        let dir = TempDir::new().unwrap();
        let path = write_template(
            dir.path(),
            json!([
                doc("https://one"),
                doc("https://two"),
                doc("https://broken"),
                doc("https://four"),
                doc("https://five")
            ]),
        );
        let judge = Arc::new(MockLlmClient::new(vec![analysis(), analysis(), analysis(), analysis()]));
        let enricher = Enricher::new(judge.clone(), StubFetcher::new());

        let report = enricher.enrich(&path, &options()).await.unwrap();

        assert!(!report.is_success());
        assert_eq!(report.documents_enriched, 4);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].index, 2);
        assert!(report.errors[0].message.contains("500"));
        assert_eq!(judge.call_count(), 4);

        let written = load_template(&report.path).unwrap();
        assert_eq!(written.documentation.len(), 5);
        let enriched: Vec<bool> = written.documentation.iter().map(|d| d.is_enriched()).collect();
        assert_eq!(enriched, vec![true, true, false, true, true]);
        assert_eq!(written.documentation[2].location, "https://broken");
        assert_eq!(written.version_history[0].errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bounds_documents_in_flight() {
        let dir = TempDir::new().unwrap();
        let locations = ["https://one", "https://two", "https://three", "https://four", "https://five"];
        let docs: Vec<Value> = locations.iter().map(|l| doc(l)).collect();
        let path = write_template(dir.path(), json!(docs));
        let judge = Arc::new(MockLlmClient::new(vec![analysis(); 5]));
        let fetcher = Arc::new(PeakFetcher {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let enricher = Enricher::new(judge.clone(), fetcher.clone());
        let bounded = EnrichOptions {
            concurrency: 2,
            ..options()
        };

        let report = enricher.enrich(&path, &bounded).await.unwrap();

        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 2);
        assert_eq!(report.documents_enriched, 5);
        assert_eq!(judge.call_count(), 5);

        let written = load_template(&report.path).unwrap();
        let order: Vec<&str> = written.documentation.iter().map(|d| d.location.as_str()).collect();
        assert_eq!(order, locations);
        assert!(written.documentation.iter().all(|d| d.is_enriched()));
    }

    #[tokio::test]
    async fn test_analysis_constrained_to_vocabulary() {
        let dir = TempDir::new().unwrap();
        let path = write_template(dir.path(), json!([doc("https://tokio")]));
        let judge = Arc::new(MockLlmClient::new(vec![analysis()]));
        let enricher = Enricher::new(judge.clone(), StubFetcher::new());

        let report = enricher.enrich(&path, &options()).await.unwrap();
        let written = load_template(&report.path).unwrap();
        let enrichment = written.documentation[0].enrichment.as_ref().unwrap();

        assert_eq!(enrichment.relevant_tasks, vec!["testing"]);
        assert_eq!(enrichment.relevant_tech_stack, vec!["tokio"]);
        assert_eq!(enrichment.relevant_tags, vec!["async"]);
        assert_eq!(enrichment.enrichment_model, "mock-model");

        let requests = judge.requests();
        let prompt = requests[0].messages[0].content.as_text().unwrap();
        assert!(prompt.contains("content of https://tokio"));
        assert!(prompt.contains("Task types: testing"));
        assert!(prompt.contains("Tech stack: tokio"));
    }

    #[tokio::test]
    async fn test_force_reenriches_and_keeps_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_template(dir.path(), json!([enriched_doc("https://a")]));
        let judge = Arc::new(MockLlmClient::new(vec![analysis()]));
        let enricher = Enricher::new(judge.clone(), StubFetcher::new());

        let report = enricher
            .enrich(
                &path,
                &EnrichOptions {
                    force: true,
                    model: Some("analysis-model".to_string()),
                    ..options()
                },
            )
            .await
            .unwrap();

        assert_eq!(judge.call_count(), 1);
        assert_eq!(judge.requests()[0].model.as_deref(), Some("analysis-model"));
        assert_eq!(report.documents_enriched, 1);

        let written = load_template(&report.path).unwrap();
        let enrichment = written.documentation[0].enrichment.as_ref().unwrap();
        assert_eq!(enrichment.summary, "How tokio schedules tasks.");
        assert_eq!(enrichment.enrichment_model, "analysis-model");
        assert_eq!(written.extra["owner"], "bench-team");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_analysis_times_out() {
        let dir = TempDir::new().unwrap();
        let path = write_template(dir.path(), json!([doc("https://slow")]));
        let judge = Arc::new(MockLlmClient::new(vec![analysis()]).with_delay(Duration::from_secs(600)));
        let enricher = Enricher::new(judge, StubFetcher::new());

        let report = enricher
            .enrich(
                &path,
                &EnrichOptions {
                    timeout: Duration::from_millis(100),
                    ..options()
                },
            )
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("timed out"));
        assert!(report.path.exists());
    }

    #[test]
    fn test_parse_enrichment_requires_summary() {
        let vocabulary = Vocabulary::default();
        let err = parse_enrichment(r#"{"keyConcepts": []}"#, &vocabulary, "m").unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
        assert!(parse_enrichment("not json", &vocabulary, "m").is_err());
    }

    #[test]
    fn test_constrain_dedupes_and_canonicalizes() {
        let allowed = vec!["bug_fix".to_string(), "testing".to_string()];
        let values = vec!["TESTING".to_string(), "testing".to_string(), "other".to_string()];
        assert_eq!(constrain(values, &allowed), vec!["testing"]);
    }
}
