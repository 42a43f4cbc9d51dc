use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use artifactstore::cli::{Cli, Command};
use artifactstore::{ArtifactStore, Version};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();

    info!("artifactstore starting");

    match cli.command {
        Command::List { template } => {
            let store = ArtifactStore::for_template(&template)?;
            let artifacts = store.list()?;
            if artifacts.is_empty() {
                println!("No artifacts found under {}", store.root().display());
            } else {
                for a in artifacts {
                    println!(
                        "{} {} {}",
                        a.version.to_string().cyan(),
                        format!("#{:03}", a.sequence).yellow(),
                        a.path.display()
                    );
                }
            }
        }
        Command::Latest { template } => {
            let store = ArtifactStore::for_template(&template)?;
            match store.latest()? {
                Some(a) => println!("{}", a.path.display()),
                None => {
                    println!("{} No artifacts; using {}", "!".yellow(), template.display());
                }
            }
        }
        Command::Next { template, version } => {
            let store = ArtifactStore::for_template(&template)?;
            let version: Version = version.parse().context("Failed to parse version")?;
            let sequence = store.next_sequence(&version)?;
            println!("{}", store.artifact_path(&version, sequence).display());
        }
    }

    Ok(())
}
