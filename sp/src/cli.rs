//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Specialist - dynamic prompt composition for agent benchmarks
#[derive(Parser)]
#[command(
    name = "sp",
    about = "Compose specialist prompts and enrich template documentation",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compose the system prompt for a request without calling a downstream model
    Compose {
        /// Template path
        template: PathBuf,

        /// User request text
        request: String,

        /// Downstream client name; `{NAME}_MODEL` picks the target model
        #[arg(long, default_value = "dry-run")]
        client: String,

        /// Workspace path exposed to the prompt
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Print the composed request and telemetry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enrich template documentation into a new versioned artifact
    Enrich {
        /// Template path
        template: PathBuf,

        /// Judgment provider (anthropic, openai)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model used for analysis
        #[arg(short, long)]
        model: Option<String>,

        /// Re-enrich entries that already carry enrichment
        #[arg(short, long)]
        force: bool,

        /// Per-document timeout in milliseconds
        #[arg(short, long, value_name = "MS")]
        timeout: Option<u64>,

        /// Documents analysed concurrently
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },

    /// Print the path a template resolves to
    Resolve {
        /// Template path
        template: PathBuf,
    },
}
