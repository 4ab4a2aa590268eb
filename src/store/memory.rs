//! In-memory [`DocumentStore`] implementation for testing.
//!
//! Uses `Vec`s behind `std::sync::RwLock` for thread safety; storage order
//! is insertion order. Vector queries are answered from a fixed
//! query-text → vector table supplied at construction (there is no real
//! embedding model in tests); a query text missing from the table fails the
//! way an unreachable model would, which exercises the keyword fallback.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::embedding::cosine_similarity;

use super::{
    metadata_strings, preferred_embedding, searchable_text, CollectionDump, DocumentStore,
    QueryMatch, StoredDocument,
};

struct StoredEntry {
    id: String,
    collection: String,
    document: String,
    metadata: HashMap<String, String>,
    vector: Vec<f32>,
}

pub struct MemoryStore {
    collections: RwLock<Vec<String>>,
    docs: RwLock<Vec<StoredEntry>>,
    query_vectors: HashMap<String, Vec<f32>>,
    vector_queries: bool,
}

impl MemoryStore {
    /// A keyword-only store: `supports_vector_query` reports `false`.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Vec::new()),
            docs: RwLock::new(Vec::new()),
            query_vectors: HashMap::new(),
            vector_queries: false,
        }
    }

    /// A vector-capable store answering queries from a fixed
    /// query-text → vector table.
    pub fn with_query_embeddings(query_vectors: HashMap<String, Vec<f32>>) -> Self {
        Self {
            collections: RwLock::new(Vec::new()),
            docs: RwLock::new(Vec::new()),
            query_vectors,
            vector_queries: true,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().unwrap();
        if !collections.iter().any(|c| c == name) {
            collections.push(name.to_string());
        }
        Ok(())
    }

    async fn add_document(
        &self,
        document: &serde_json::Value,
        collection: &str,
    ) -> Result<String> {
        self.get_or_create_collection(collection).await?;

        let vector = preferred_embedding(document)?;
        let id = Uuid::new_v4().to_string();

        self.docs.write().unwrap().push(StoredEntry {
            id: id.clone(),
            collection: collection.to_string(),
            document: searchable_text(document),
            metadata: metadata_strings(document),
            vector,
        });

        Ok(id)
    }

    async fn query_by_text(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<QueryMatch>> {
        let query_vec = match self.query_vectors.get(query) {
            Some(vec) => vec,
            None => bail!("No embedding available for query '{}'", query),
        };

        let docs = self.docs.read().unwrap();
        let mut matches: Vec<QueryMatch> = docs
            .iter()
            .filter(|entry| entry.collection == collection)
            .map(|entry| QueryMatch {
                id: entry.id.clone(),
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
                distance: Some(1.0 - cosine_similarity(query_vec, &entry.vector) as f64),
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }

    async fn get_document(&self, id: &str, collection: &str) -> Result<Option<StoredDocument>> {
        let docs = self.docs.read().unwrap();
        Ok(docs
            .iter()
            .find(|entry| entry.id == id && entry.collection == collection)
            .map(|entry| StoredDocument {
                id: entry.id.clone(),
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
            }))
    }

    async fn get_all_documents(&self, collection: &str) -> Result<CollectionDump> {
        let docs = self.docs.read().unwrap();
        let mut dump = CollectionDump::default();

        for entry in docs.iter().filter(|entry| entry.collection == collection) {
            dump.ids.push(entry.id.clone());
            dump.documents.push(entry.document.clone());
            dump.metadatas.push(entry.metadata.clone());
        }

        Ok(dump)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.read().unwrap().clone())
    }

    async fn delete_document(&self, id: &str, collection: &str) -> Result<bool> {
        let mut docs = self.docs.write().unwrap();
        let before = docs.len();
        docs.retain(|entry| !(entry.id == id && entry.collection == collection));
        Ok(docs.len() < before)
    }

    fn supports_vector_query(&self) -> bool {
        self.vector_queries
    }
}
