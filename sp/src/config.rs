//! Specialist configuration types and loading
//!
//! Two layers live here. [`Config`] is the YAML file config used by the `sp`
//! binary (judgment-model provider, enrichment defaults, log level).
//! [`CompositionConfig`] is the immutable per-adapter snapshot built once from
//! environment overrides, template-declared strategy and hard-coded defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::template::{PromptStrategy, SubstitutionStyle};

pub const DEFAULT_PROVIDER: &str = "anthropic";
pub const DEFAULT_JUDGMENT_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CACHE_TTL_MS: u64 = 3_600_000;
pub const DEFAULT_ENRICH_CONCURRENCY: usize = 3;

pub const ENV_PROVIDER: &str = "SPECIALIST_PROVIDER";
pub const ENV_SELECTION_MODEL: &str = "SPECIALIST_SELECTION_MODEL";
pub const ENV_EXTRACTION_MODEL: &str = "SPECIALIST_EXTRACTION_MODEL";
pub const ENV_TIMEOUT_MS: &str = "SPECIALIST_TIMEOUT_MS";
pub const ENV_CACHE_TTL_MS: &str = "SPECIALIST_CACHE_TTL_MS";
pub const ENV_FALLBACK_TO_STATIC: &str = "SPECIALIST_FALLBACK_TO_STATIC";
pub const ENV_MODEL_ASSISTED: &str = "SPECIALIST_MODEL_ASSISTED";

/// Main specialist configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Judgment-model provider configuration
    pub llm: LlmConfig,

    /// Enrichment defaults
    pub enrichment: EnrichmentConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        debug!(?config_path, "Config::load: called");
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::candidates(),
        };
        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    /// `.specialist.yml`, then `~/.config/specialist/specialist.yml`
    fn candidates() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(".specialist.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("specialist").join("specialist.yml"));
        }
        candidates
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Judgment-model provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("anthropic" or "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_JUDGMENT_MODEL.to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Provider defaults (key variable and base URL) for a provider name
    pub fn for_provider(provider: &str) -> Self {
        debug!(%provider, "LlmConfig::for_provider: called");
        match provider {
            "openai" => Self {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                base_url: "https://api.openai.com".to_string(),
                ..Self::default()
            },
            other => Self {
                provider: other.to_string(),
                ..Self::default()
            },
        }
    }

    /// Same settings, other provider; provider-specific fields reset when it changes
    pub fn with_provider(&self, provider: &str) -> Self {
        if provider == self.provider {
            return self.clone();
        }
        Self {
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
            ..Self::for_provider(provider)
        }
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("LLM API key not found. Set the {} environment variable.", self.api_key_env))
    }
}

/// Enrichment defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Documents analysed concurrently per batch
    pub concurrency: usize,

    /// Per-document analysis timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_ENRICH_CONCURRENCY,
            timeout_ms: 60_000,
        }
    }
}

/// Environment variable naming the downstream client's active model
///
/// `my-client` becomes `MY_CLIENT_MODEL`.
pub fn model_env_var(client_name: &str) -> String {
    let upper: String = client_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{upper}_MODEL")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Snapshot of the composition-related environment, taken once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub provider: Option<String>,
    pub selection_model: Option<String>,
    pub extraction_model: Option<String>,
    pub timeout_ms: Option<u64>,
    pub cache_ttl_ms: Option<u64>,
    pub fallback_to_static: Option<bool>,
    pub model_assisted: Option<bool>,
    pub target_model: Option<String>,
}

impl EnvOverrides {
    /// Read the process environment
    pub fn from_env(client_name: &str) -> Self {
        Self::from_lookup(client_name, |key| std::env::var(key).ok())
    }

    /// Build from any key lookup; malformed values are ignored with a warning
    pub fn from_lookup<F>(client_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!(%client_name, "EnvOverrides::from_lookup: called");
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let number = |key: &str| {
            let raw = text(key)?;
            match raw.parse::<u64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!(%key, value = %raw, "Ignoring non-numeric environment override");
                    None
                }
            }
        };
        let flag = |key: &str| {
            let raw = text(key)?;
            let parsed = parse_bool(&raw);
            if parsed.is_none() {
                warn!(%key, value = %raw, "Ignoring non-boolean environment override");
            }
            parsed
        };

        Self {
            provider: text(ENV_PROVIDER),
            selection_model: text(ENV_SELECTION_MODEL),
            extraction_model: text(ENV_EXTRACTION_MODEL),
            timeout_ms: number(ENV_TIMEOUT_MS),
            cache_ttl_ms: number(ENV_CACHE_TTL_MS),
            fallback_to_static: flag(ENV_FALLBACK_TO_STATIC),
            model_assisted: flag(ENV_MODEL_ASSISTED),
            target_model: text(&model_env_var(client_name)),
        }
    }
}

/// Settings one adapter runs with, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionConfig {
    pub provider: String,
    pub selection_model: String,
    pub extraction_model: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub fallback_to_static: bool,
    pub model_assisted: bool,
    pub substitution: SubstitutionStyle,
    /// Model the downstream client targets, if known
    pub target_model: Option<String>,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            selection_model: DEFAULT_JUDGMENT_MODEL.to_string(),
            extraction_model: DEFAULT_JUDGMENT_MODEL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            fallback_to_static: true,
            model_assisted: true,
            substitution: SubstitutionStyle::default(),
            target_model: None,
        }
    }
}

impl CompositionConfig {
    /// Environment over template strategy over defaults
    pub fn layered(env: &EnvOverrides, strategy: &PromptStrategy) -> Self {
        Self::layered_over(env, strategy, &LlmConfig::default())
    }

    /// Environment over template strategy over the file-configured provider
    ///
    /// Judgment models not set explicitly default to the resolved provider's
    /// model: `base.model` when the provider is unchanged, the provider
    /// default otherwise.
    pub fn layered_over(env: &EnvOverrides, strategy: &PromptStrategy, base: &LlmConfig) -> Self {
        debug!(?env, ?strategy, provider = %base.provider, "CompositionConfig::layered_over: called");
        let defaults = Self::default();

        let pick = |env: &Option<String>, tpl: &Option<String>, default: String| {
            env.clone().or_else(|| tpl.clone()).unwrap_or(default)
        };

        let provider = pick(&env.provider, &strategy.provider, base.provider.clone());
        let judgment_model = base.with_provider(&provider).model;

        Self {
            selection_model: pick(&env.selection_model, &strategy.selection_model, judgment_model.clone()),
            extraction_model: pick(&env.extraction_model, &strategy.extraction_model, judgment_model),
            provider,
            timeout: env
                .timeout_ms
                .or(strategy.timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            cache_ttl: env
                .cache_ttl_ms
                .or(strategy.cache_ttl_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.cache_ttl),
            fallback_to_static: env
                .fallback_to_static
                .or(strategy.fallback_to_static)
                .unwrap_or(defaults.fallback_to_static),
            model_assisted: env
                .model_assisted
                .or(strategy.model_assisted)
                .unwrap_or(defaults.model_assisted),
            substitution: strategy.substitution.unwrap_or(defaults.substitution),
            target_model: env.target_model.clone(),
        }
    }
}
