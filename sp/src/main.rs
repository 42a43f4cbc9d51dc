//! Specialist - prompt composition CLI
//!
//! Composes specialist prompts for inspection, enriches template
//! documentation and resolves template paths.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use specialist::cli::{Cli, Command};
use specialist::compose::PromptAdapter;
use specialist::config::Config;
use specialist::downstream::{ChatRole, DryRunClient, ExecutionRequest};
use specialist::enrich::{EnrichOptions, Enricher, EnrichmentReport, HttpFileFetcher};
use specialist::llm::create_client;
use specialist::prompts::PromptLoader;
use specialist::template::resolve_template_path;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("specialist")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("specialist.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("Specialist loaded config: provider={}", config.llm.provider);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Compose {
            template,
            request,
            client,
            workspace,
            json,
        } => cmd_compose(&config, template, request, &client, workspace, json).await,
        Command::Enrich {
            template,
            provider,
            model,
            force,
            timeout,
            concurrency,
        } => {
            let report = cmd_enrich(&config, template, provider, model, force, timeout, concurrency).await?;
            if !report.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Resolve { template } => {
            let resolved = resolve_template_path(&template)?;
            println!("{}", resolved.display());
            Ok(())
        }
    }
}

async fn cmd_compose(
    config: &Config,
    template: PathBuf,
    request: String,
    client: &str,
    workspace: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    debug!(?template, %client, "cmd_compose: called");
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let adapter = PromptAdapter::builder(&template, Arc::new(DryRunClient::new(client)))
        .llm_config(config.llm.clone())
        .prompts(PromptLoader::new(&cwd))
        .build();

    let mut request = ExecutionRequest::from_user(request);
    if let Some(workspace) = workspace {
        request = request.with_workspace(workspace);
    }

    let response = adapter.execute(request).await?;
    let telemetry = adapter.last_telemetry();

    if json {
        let composed: serde_json::Value =
            serde_json::from_str(&response.content).context("Failed to read composed request")?;
        let output = serde_json::json!({
            "request": composed,
            "telemetry": telemetry,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(path) = adapter.resolved_path() {
        println!("{} {}", "Template:".bold(), path.display());
    }
    if let Some(telemetry) = telemetry {
        println!(
            "{} {} ({:?})",
            "Prompt:".bold(),
            telemetry.selected_prompt_id.cyan(),
            telemetry.path
        );
        if let Some(confidence) = telemetry.confidence {
            println!("{} {:?}", "Confidence:".bold(), confidence);
        }
        if let Some(reason) = &telemetry.fallback_reason {
            println!("{} {}", "Fallback:".yellow().bold(), reason);
        }
    }

    let system = adapter
        .last_messages()
        .and_then(|messages| messages.into_iter().find(|m| m.role == ChatRole::System))
        .map(|m| m.content)
        .unwrap_or_default();
    println!();
    println!("{}", system);
    Ok(())
}

async fn cmd_enrich(
    config: &Config,
    template: PathBuf,
    provider: Option<String>,
    model: Option<String>,
    force: bool,
    timeout: Option<u64>,
    concurrency: Option<usize>,
) -> Result<EnrichmentReport> {
    debug!(?template, ?provider, ?model, force, "cmd_enrich: called");
    let provider = provider.unwrap_or_else(|| config.llm.provider.clone());
    let mut llm = config.llm.with_provider(&provider);
    if let Some(model) = &model {
        llm.model = model.clone();
    }
    let judge = create_client(&llm).context("Failed to create judgment client")?;

    let options = EnrichOptions {
        provider,
        model,
        force,
        timeout: Duration::from_millis(timeout.unwrap_or(config.enrichment.timeout_ms)),
        concurrency: concurrency.unwrap_or(config.enrichment.concurrency),
    };

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let fetcher = HttpFileFetcher::new().context("Failed to create document fetcher")?;
    let enricher = Enricher::new(judge, Arc::new(fetcher)).with_prompts(PromptLoader::new(&cwd));

    println!("{} {}", "Enriching".cyan(), template.display());
    let report = enricher.enrich(&template, &options).await?;

    println!("{} {}", "Wrote".green().bold(), report.path.display());
    println!("  version:  {} #{:03}", report.version, report.sequence);
    println!("  enriched: {}", report.documents_enriched);
    println!("  skipped:  {}", report.documents_skipped);
    if !report.errors.is_empty() {
        println!("  {} {}", "errors:".red().bold(), report.errors.len());
        for failure in &report.errors {
            println!("    [{}] {}: {}", failure.index, failure.location, failure.message);
        }
    }

    Ok(report)
}
