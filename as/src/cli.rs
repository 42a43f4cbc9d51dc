//! CLI argument parsing for artifactstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "as")]
#[command(author, version, about = "Append-only store for enriched template artifacts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every artifact of a template, oldest first
    List {
        /// Template path (base template or any of its artifacts)
        #[arg(required = true)]
        template: PathBuf,
    },

    /// Print the most recent artifact of a template
    Latest {
        /// Template path (base template or any of its artifacts)
        #[arg(required = true)]
        template: PathBuf,
    },

    /// Print the path the next artifact for a version would occupy
    Next {
        /// Template path (base template or any of its artifacts)
        #[arg(required = true)]
        template: PathBuf,

        /// Version directory (MAJOR.MINOR.PATCH)
        #[arg(required = true)]
        version: String,
    },
}
