//! lesession binary entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lesession::config::DEFAULT_CONFIG_FILE;
use lesession::{
    EngineConfig, RawMessage, SearchFilters, SearchOptions, SessionSearchEngine, SortBy, SortOrder,
    DEFAULT_SUGGESTION_LIMIT,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Session id used when the caller does not name one
const DEFAULT_SESSION: &str = "cli";

/// LeSession - Fuzzy search over chat session messages
#[derive(Parser, Debug)]
#[command(name = "lesession")]
#[command(author = "LeSession Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Index a chat session and search it with fuzzy matching", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(global = true, long = "config", short = 'c', default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the messages of a JSON file
    Search {
        /// JSON array of messages
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Search query
        #[arg(value_name = "QUERY")]
        query: String,

        /// Session id to index the messages under
        #[arg(long = "session", default_value = DEFAULT_SESSION)]
        session: String,

        /// Maximum number of results to return
        #[arg(long = "limit", default_value = "50")]
        limit: usize,

        /// Results to skip
        #[arg(long = "offset", default_value = "0")]
        offset: usize,

        /// Ordering key: relevance, date or score
        #[arg(long = "sort-by", default_value = "relevance")]
        sort_by: SortBy,

        /// Ordering direction: asc or desc
        #[arg(long = "order", default_value = "desc")]
        order: SortOrder,

        /// Only messages whose sender contains this text
        #[arg(long = "sender")]
        sender: Option<String>,

        /// Only messages of this type
        #[arg(long = "type")]
        message_type: Option<String>,

        /// Only messages with an attached file
        #[arg(long = "has-attachment")]
        has_attachment: bool,
    },

    /// Autocomplete a partial query
    Suggest {
        /// JSON array of messages
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Partial query
        #[arg(value_name = "PARTIAL")]
        partial: String,

        /// Maximum number of suggestions
        #[arg(long = "limit", default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },

    /// Index a file and print engine stats
    Stats {
        /// JSON array of messages
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = EngineConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?
        .with_env();
    let mut engine = SessionSearchEngine::new(config).context("Failed to create search engine")?;

    match cli.command {
        Commands::Search {
            file,
            query,
            session,
            limit,
            offset,
            sort_by,
            order,
            sender,
            message_type,
            has_attachment,
        } => {
            index_file(&mut engine, &session, &file)?;

            let options = SearchOptions {
                limit,
                offset,
                sort_by,
                sort_order: order,
                filters: SearchFilters {
                    sender,
                    message_type,
                    has_attachment,
                    ..Default::default()
                },
                ..Default::default()
            };

            let response = engine
                .search(&session, &query, &options)
                .await
                .context("Search failed")?;
            print_json(&response)?;
        }
        Commands::Suggest { file, partial, limit } => {
            index_file(&mut engine, DEFAULT_SESSION, &file)?;

            let suggestions = engine
                .get_suggestions(DEFAULT_SESSION, &partial, limit)
                .await
                .context("Suggestion lookup failed")?;
            print_json(&suggestions)?;
        }
        Commands::Stats { file } => {
            index_file(&mut engine, DEFAULT_SESSION, &file)?;
            print_json(&engine.get_stats(None))?;
        }
    }

    engine.destroy();
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn index_file(engine: &mut SessionSearchEngine, session_id: &str, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let messages: Vec<RawMessage> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse messages in {}", path.display()))?;

    let report = engine
        .index_messages(session_id, &messages)
        .context("Indexing failed")?;
    info!(
        "Indexed {} of {} messages from {}",
        report.indexed,
        report.total,
        path.display()
    );

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
