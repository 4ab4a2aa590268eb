//! Core data models used throughout pagedex.
//!
//! These types represent the pages, documents, and search results that flow
//! through the scrape → embed → store → search pipeline.

use serde::{Deserialize, Serialize};

/// Structured content extracted from a scraped web page.
///
/// This is the JSON shape produced by `pagedex scrape` and accepted by
/// `pagedex process`; the embedding step enriches it with an `embeddings`
/// map before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub title: String,
    pub url: String,
    pub description: String,
    /// `Last-Modified` (or `Date`) response header, when the server sent one.
    pub last_modified: Option<String>,
    pub content: String,
}

/// A single ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub url: String,
    /// At most 200 characters of the document body, with a trailing `"..."`
    /// when truncated. Empty when the document has no body.
    pub content_snippet: String,
    /// `None` when the store returned no distance for this match.
    pub similarity_score: Option<f64>,
}

/// Structured result envelope shared by the CLI, HTTP, and MCP transports.
///
/// Collaborator failures never propagate past the ranking engine; they are
/// reported here as `success: false` with an `error` message. Absent
/// collections and empty collections are zero-count successes with an
/// explanatory `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub success: bool,
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchHit>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl SearchOutcome {
    /// A zero-count success with an explanatory message.
    pub fn empty(query: &str, message: impl Into<String>) -> Self {
        Self {
            success: true,
            query: query.to_string(),
            count: 0,
            results: Vec::new(),
            message: Some(message.into()),
            error: None,
        }
    }

    /// A structured failure (store unreachable and similar hard errors).
    pub fn failure(query: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            query: query.to_string(),
            count: 0,
            results: Vec::new(),
            message: None,
            error: Some(error.into()),
        }
    }

    pub fn hits(query: &str, results: Vec<SearchHit>) -> Self {
        Self {
            success: true,
            query: query.to_string(),
            count: results.len(),
            results,
            message: None,
            error: None,
        }
    }
}
