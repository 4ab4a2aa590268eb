//! # pagedex CLI
//!
//! The `pagedex` binary drives the scrape → embed → store → search pipeline.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pagedex process <json>` | Add embeddings to a JSON document, optionally store it |
//! | `pagedex scrape <url>` | Scrape a web page, embed it, optionally store it |
//! | `pagedex query "<text>"` | Search stored documents |
//! | `pagedex list` | List database collections |
//! | `pagedex serve http` | Start the HTTP API server |
//! | `pagedex serve mcp` | Start the MCP tool server on stdio |
//!
//! ## Examples
//!
//! ```bash
//! # Scrape a page and store it
//! pagedex scrape https://example.com/article --store
//!
//! # Process an existing JSON file
//! pagedex process page.json --store --collection docs
//!
//! # Search
//! pagedex query "vector search tutorial" --limit 3
//!
//! # Serve the REST API
//! pagedex serve http
//! ```

mod config;
mod embedding;
mod extract;
mod mcp;
mod models;
mod process;
mod scrape;
mod search;
mod server;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pagedex — scrape web pages, embed their text fields, and search them.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; built-in defaults are used when the file does not exist. See
/// `config/pagedex.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pagedex",
    about = "Scrape web pages, embed their text fields, and search them via CLI, HTTP, and MCP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pagedex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Process JSON data with embeddings.
    ///
    /// Accepts either a path to a JSON file or an inline JSON string,
    /// embeds its text fields, and prints the enhanced document with
    /// vectors elided for readability.
    Process {
        /// JSON data as a string, or a path to a JSON file.
        json_input: String,

        /// Store the enhanced document in the vector database.
        #[arg(long)]
        store: bool,

        /// Database collection name.
        #[arg(long)]
        collection: Option<String>,
    },

    /// Scrape a URL and process the result with embeddings.
    ///
    /// Extracts the title, description, and heading/paragraph content
    /// (as markdown) before embedding.
    Scrape {
        /// URL to scrape.
        url: String,

        /// Store the enhanced document in the vector database.
        #[arg(long)]
        store: bool,

        /// Database collection name.
        #[arg(long)]
        collection: Option<String>,
    },

    /// Query the vector database for similar content.
    ///
    /// Uses vector similarity when an embedding provider is configured,
    /// and deterministic keyword scoring otherwise.
    Query {
        /// Text to search for.
        query_text: String,

        /// Database collection name.
        #[arg(long)]
        collection: Option<String>,

        /// Maximum number of results (1-20).
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// List all database collections.
    List,

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// search and collections endpoints.
    Http,

    /// Start the MCP tool server on stdio.
    ///
    /// Exposes the `search_website` tool to MCP clients such as Claude
    /// and Cursor.
    Mcp,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Process {
            json_input,
            store,
            collection,
        } => {
            process::run_process(&cfg, &json_input, store, collection).await?;
        }
        Commands::Scrape {
            url,
            store,
            collection,
        } => {
            process::run_scrape(&cfg, &url, store, collection).await?;
        }
        Commands::Query {
            query_text,
            collection,
            limit,
        } => {
            if !(1..=20).contains(&limit) {
                anyhow::bail!("limit must be between 1 and 20");
            }
            process::run_query(&cfg, &query_text, collection, limit).await?;
        }
        Commands::List => {
            process::run_list(&cfg).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Http => {
                server::run_server(&cfg).await?;
            }
            ServeService::Mcp => {
                mcp::run_mcp_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
