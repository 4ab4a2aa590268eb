//! Storage abstraction for pagedex.
//!
//! The [`DocumentStore`] trait defines all storage operations the search
//! pipeline depends on, enabling pluggable backends (SQLite, in-memory).
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! Documents are stored once at ingestion time and never mutated; the only
//! mutating operations are `add_document` and `delete_document`, both
//! single-document and atomic at the backend level.

pub mod memory;
pub mod sqlite;

use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Preferred source field for the stored vector, best first.
///
/// A document carries one embedding per text field; the store keeps a single
/// vector per document, chosen in this order (falling back to whatever
/// embedding is present when none of these match).
const PREFERRED_EMBEDDINGS: [&str; 3] = [
    "content_embedding",
    "description_embedding",
    "title_embedding",
];

/// A match returned from a nearest-neighbor query.
///
/// `distance` is a **cosine distance** (`1 - cosine similarity`): `0.0` is an
/// identical direction, larger is farther. It is `None` when the backend did
/// not compute one.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    /// Combined searchable text stored alongside the vector.
    pub document: String,
    /// Stringified document fields (title, url, description, content, ...).
    pub metadata: HashMap<String, String>,
    pub distance: Option<f64>,
}

/// A document fetched by id.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub document: String,
    pub metadata: HashMap<String, String>,
}

/// Whole-collection dump used by the keyword fallback scorer.
///
/// The three vectors are parallel and preserve storage order, which is the
/// tie-break order for equal keyword scores.
#[derive(Debug, Clone, Default)]
pub struct CollectionDump {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<HashMap<String, String>>,
}

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_or_create_collection`](DocumentStore::get_or_create_collection) | Idempotent collection creation |
/// | [`add_document`](DocumentStore::add_document) | Store an embedded document |
/// | [`query_by_text`](DocumentStore::query_by_text) | Nearest-neighbor query over a collection |
/// | [`get_document`](DocumentStore::get_document) | Fetch a document by id |
/// | [`get_all_documents`](DocumentStore::get_all_documents) | Dump a collection for keyword scoring |
/// | [`list_collections`](DocumentStore::list_collections) | List collection names |
/// | [`delete_document`](DocumentStore::delete_document) | Delete a document by id |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a collection if it does not exist. Safe to call repeatedly.
    async fn get_or_create_collection(&self, name: &str) -> Result<()>;

    /// Store a document (a JSON object carrying an `embeddings` map) and
    /// return its generated id.
    ///
    /// Errors when the document has no embeddings.
    async fn add_document(&self, document: &serde_json::Value, collection: &str)
        -> Result<String>;

    /// Embed `query` with the same model used at ingestion and return up to
    /// `limit` matches ordered by ascending distance.
    async fn query_by_text(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<QueryMatch>>;

    /// Fetch a single document by id, or `None` when absent.
    async fn get_document(&self, id: &str, collection: &str) -> Result<Option<StoredDocument>>;

    /// Dump every document in a collection, in storage order.
    async fn get_all_documents(&self, collection: &str) -> Result<CollectionDump>;

    /// List all collection names.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Whether a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_collections().await?.iter().any(|c| c == name))
    }

    /// Delete a document by id. Returns `false` when nothing was deleted.
    async fn delete_document(&self, id: &str, collection: &str) -> Result<bool>;

    /// Whether this store can serve [`query_by_text`](DocumentStore::query_by_text).
    ///
    /// Drives strategy selection in the ranking engine: stores that cannot
    /// embed a query (no provider configured) report `false` and searches
    /// use the keyword fallback instead.
    fn supports_vector_query(&self) -> bool;
}

/// Pick the stored vector for a document from its `embeddings` map.
pub(crate) fn preferred_embedding(document: &serde_json::Value) -> Result<Vec<f32>> {
    let embeddings = match document.get("embeddings").and_then(|e| e.as_object()) {
        Some(map) if !map.is_empty() => map,
        _ => bail!("No embeddings found in document data"),
    };

    let value = PREFERRED_EMBEDDINGS
        .iter()
        .find_map(|field| embeddings.get(*field))
        .or_else(|| embeddings.values().next())
        .ok_or_else(|| anyhow::anyhow!("No embeddings found in document data"))?;

    let array = value
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("Embedding is not an array"))?;

    Ok(array
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}

/// Stringify every document field except `embeddings` for metadata storage.
///
/// Strings are kept as-is, nulls become empty strings, everything else is
/// rendered as JSON.
pub(crate) fn metadata_strings(document: &serde_json::Value) -> HashMap<String, String> {
    let mut metadata = HashMap::new();

    if let Some(obj) = document.as_object() {
        for (key, value) in obj {
            if key == "embeddings" {
                continue;
            }
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            metadata.insert(key.clone(), rendered);
        }
    }

    metadata
}

/// Combine the text fields of a document into one searchable string.
pub(crate) fn searchable_text(document: &serde_json::Value) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for field in ["title", "description", "content"] {
        if let Some(text) = document.get(field).and_then(|v| v.as_str()) {
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }

    parts.join(" ")
}
