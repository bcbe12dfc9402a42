//! # Health Context CLI (`hctx`)
//!
//! Initializes the record tables, inspects sources, dumps corpora, answers
//! questions, and runs the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! hctx --config ./config/hctx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `hctx init` | Create the SQLite database and record tables |
//! | `hctx sources` | List sources and whether they are reachable |
//! | `hctx corpus` | Build the corpus and print it as JSON |
//! | `hctx ask "<question>"` | Answer a question, print the response as JSON |
//! | `hctx serve` | Start the HTTP server |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use health_context::{ask, config, corpus, db, migrate, server, sources, store};

/// Health Context CLI: builds retrieval-ready corpora from health records.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "hctx",
    about = "Health Context: builds retrieval-ready corpora from health records",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/hctx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite file and the messages, symptom_logs and
    /// activity_logs tables. Safe to run repeatedly.
    Init,

    /// List sources and their status.
    Sources,

    /// Build the corpus and print it as JSON.
    Corpus {
        /// Restrict to one session; omit for the most recent records overall.
        #[arg(long)]
        session: Option<String>,
    },

    /// Ask a question over the corpus.
    Ask {
        question: String,

        #[arg(long)]
        session: Option<String>,

        /// Number of chunks to return (clamped to 1..=20).
        #[arg(long)]
        k: Option<i64>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sources => {
            let pool = db::connect(&cfg).await?;
            let record_store = store::SqliteRecordStore::new(pool.clone());
            sources::list_sources(&cfg, &record_store).await?;
            pool.close().await;
        }
        Commands::Corpus { session } => {
            corpus::run_corpus(&cfg, session).await?;
        }
        Commands::Ask {
            question,
            session,
            k,
        } => {
            ask::run_ask(&cfg, &question, session, k).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
