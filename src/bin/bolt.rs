//! CLI binary for bolt.
//!
//! Results and upload outcomes are written to stdout as JSON. All tracing
//! output goes to stderr so stdout stays machine-readable.

use std::path::{Path, PathBuf};

use bolt::{BoltConfig, Services};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Bolt: question/answer search over a term index.
#[derive(Parser)]
#[command(name = "bolt", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search for documents matching any query word, ranked by how many match.
    Search {
        /// Query words; joined with spaces.
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results (defaults to `search.default_limit`).
        #[arg(short, long)]
        limit: Option<usize>,

        /// Upload file ingested before searching.
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Upload a document file (one JSON object or an array).
    Ingest {
        /// File to upload.
        file: PathBuf,

        /// Upload file ingested first.
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bolt=info,bolt_search=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = BoltConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Search { query, limit, seed } => {
            let services = start(&config, seed.as_deref()).await?;
            let results = services.search(&query.join(" "), limit).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Ingest { file, seed } => {
            let services = start(&config, seed.as_deref()).await?;
            let outcomes = services.ingest_file(&file).await?;
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
        Command::Config => {
            config.validate()?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

async fn start(config: &BoltConfig, seed: Option<&Path>) -> anyhow::Result<Services> {
    let services = Services::from_config(config)?;
    if let Some(seed) = seed {
        let outcomes = services.ingest_file(seed).await?;
        tracing::info!(
            documents = outcomes.len(),
            seed = %seed.display(),
            "seed loaded"
        );
    }
    Ok(services)
}
