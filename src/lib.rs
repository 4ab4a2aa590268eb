//! # pagedex
//!
//! A small pipeline for scraping, embedding, storing, and searching web
//! content: fetch a page, extract structured text (title, description,
//! heading/paragraph content as markdown), attach vector embeddings to the
//! text fields, store the enhanced document in a vector store, and expose
//! similarity search through a CLI, an HTTP API, and an MCP tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐
//! │  Scrape  │──▶│   Embed    │──▶│  SQLite   │
//! │ fetch+   │   │ per text  │   │ vectors + │
//! │ extract  │   │   field   │   │ metadata  │
//! └──────────┘   └───────────┘   └────┬─────┘
//!                                     │
//!                   ┌────────┬────────┤
//!                   ▼        ▼        ▼
//!              ┌────────┐ ┌──────┐ ┌──────┐
//!              │  CLI   │ │ HTTP │ │ MCP  │
//!              └────────┘ └──────┘ └──────┘
//! ```
//!
//! ## Search strategies
//!
//! Search runs one of two mutually exclusive strategies, chosen by a
//! capability check: vector similarity when an embedding provider is
//! configured, and a deterministic keyword-overlap score otherwise. A
//! failing vector query degrades to the keyword path within the same call;
//! see [`search`] for the full contract.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | HTML → structured text extraction |
//! | [`scrape`] | Page fetching |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Document store trait, SQLite and in-memory backends |
//! | [`search`] | Two-strategy document ranking |
//! | [`process`] | CLI orchestration |
//! | [`server`] | HTTP API server |
//! | [`mcp`] | MCP tool server |

pub mod config;
pub mod embedding;
pub mod extract;
pub mod mcp;
pub mod models;
pub mod process;
pub mod scrape;
pub mod search;
pub mod server;
pub mod store;
