use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod embeddings;
mod error;
mod index;
mod memory;
mod search;
mod types;
mod vault;

use cli::memory::RecordArgs;
use types::Filters;

#[derive(Parser)]
#[command(name = "vault-memory")]
#[command(version)]
#[command(about = "Keyword, semantic and hybrid recall over a Markdown note vault")]
struct Cli {
    /// Vault root (defaults to $OBSIDIAN_VAULT_ROOT, then the nearest
    /// directory containing memory/)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Log backend selection and sync progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Only records of this type
    #[arg(long = "type")]
    record_type: Option<String>,

    /// Only records from this date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Only records with importance >= N
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    importance: Option<u8>,

    /// Maximum results to show
    #[arg(long, default_value = "10")]
    max: usize,
}

impl FilterArgs {
    fn filters(&self) -> Filters {
        Filters {
            date: self.date.clone(),
            record_type: self.record_type.clone(),
            min_importance: self.importance,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create memory/ and MEMORY.md in the vault
    Init,

    /// Append a memory to today's daily log
    Remember {
        /// Content to remember
        content: String,

        /// Importance (1-5)
        #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u8).range(1..=5))]
        importance: u8,

        /// Comma-separated tags
        #[arg(short, long, default_value = "")]
        tags: String,
    },

    /// Write a structured record
    Record {
        #[arg(long)]
        title: String,

        /// One of daily-log, decision, task, learning, meeting, preference
        #[arg(long = "type")]
        record_type: String,

        #[arg(long, default_value = "")]
        content: String,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Importance (1-5)
        #[arg(long)]
        importance: Option<u8>,

        #[arg(long)]
        project: Option<String>,

        /// One of in-progress, done, paused, archived
        #[arg(long)]
        status: Option<String>,
    },

    /// Record a decision and add it to MEMORY.md
    Decide {
        /// What was decided
        content: String,

        /// Importance (1-5, default 4)
        #[arg(short, long)]
        importance: Option<u8>,

        #[arg(short, long)]
        project: Option<String>,
    },

    /// Recall memories from the vector index
    Recall {
        query: String,

        /// Maximum results
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },

    /// Re-index every memory file
    Sync,

    /// Report whether memory/ and MEMORY.md exist (exits 1 unless ready)
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Keyword search over titles, bodies and tags
    Search {
        query: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Term-frequency similarity search
    Semantic {
        query: String,

        /// Minimum similarity (default from config, 0.7)
        #[arg(long)]
        threshold: Option<f64>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Weighted keyword and semantic search
    Hybrid {
        query: String,

        #[arg(long)]
        keyword_weight: Option<f64>,

        #[arg(long)]
        semantic_weight: Option<f64>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// View or set configuration
    Config {
        /// Config key
        key: Option<String>,

        /// Config value
        value: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let vault = cli.vault.as_deref();

    let result = match cli.command {
        Commands::Init => cli::memory::run_init(vault),
        Commands::Remember {
            content,
            importance,
            tags,
        } => cli::memory::run_remember(vault, &content, importance, &tags),
        Commands::Record {
            title,
            record_type,
            content,
            tags,
            importance,
            project,
            status,
        } => cli::memory::run_record(
            vault,
            RecordArgs {
                title,
                record_type,
                content,
                tags,
                importance,
                project,
                status,
            },
        ),
        Commands::Decide {
            content,
            importance,
            project,
        } => cli::memory::run_decide(vault, &content, importance, project.as_deref()),
        Commands::Recall { query, limit } => cli::memory::run_recall(vault, &query, limit),
        Commands::Sync => cli::memory::run_sync(vault),
        Commands::Status { json } => cli::status::run_status(vault, json),
        Commands::Search { query, filters } => {
            cli::search::run_search(vault, &query, &filters.filters(), filters.max)
        }
        Commands::Semantic {
            query,
            threshold,
            filters,
        } => cli::search::run_semantic(vault, &query, threshold, &filters.filters(), filters.max),
        Commands::Hybrid {
            query,
            keyword_weight,
            semantic_weight,
            filters,
        } => cli::search::run_hybrid(
            vault,
            &query,
            keyword_weight,
            semantic_weight,
            &filters.filters(),
            filters.max,
        ),
        Commands::Config { key, value } => {
            cli::config::run_config(vault, key.as_deref(), value.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
