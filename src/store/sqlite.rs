//! SQLite-backed [`DocumentStore`].
//!
//! One database file per deployment, one row per document, collections as a
//! separate table so an empty collection is distinguishable from a missing
//! one. Embedding vectors are stored as little-endian f32 BLOBs and
//! nearest-neighbor queries are brute-force cosine distance computed in
//! Rust, the same shape the keyword-vs-vector contract expects from any
//! backend.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use uuid::Uuid;

use crate::config::{Config, EmbeddingConfig};
use crate::embedding;

use super::{
    metadata_strings, preferred_embedding, searchable_text, CollectionDump, DocumentStore,
    QueryMatch, StoredDocument,
};

pub struct SqliteStore {
    pool: SqlitePool,
    embedding: EmbeddingConfig,
}

impl SqliteStore {
    /// Open (creating if missing) the store at the configured path.
    pub async fn open(config: &Config) -> Result<Self> {
        let db_path = &config.store.path;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open vector store at {}", db_path.display()))?;

        let store = Self {
            pool,
            embedding: config.embedding.clone(),
        };
        store.ensure_schema().await?;

        tracing::info!(path = %db_path.display(), "vector store opened");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name        TEXT PRIMARY KEY,
                description TEXT NOT NULL DEFAULT '',
                created_at  INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id            TEXT PRIMARY KEY,
                collection    TEXT NOT NULL REFERENCES collections(name),
                document      TEXT NOT NULL,
                metadata_json TEXT NOT NULL,
                embedding     BLOB NOT NULL,
                created_at    INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get_or_create_collection(&self, name: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO collections (name, description, created_at) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind("Scraped web content with embeddings")
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_document(
        &self,
        document: &serde_json::Value,
        collection: &str,
    ) -> Result<String> {
        self.get_or_create_collection(collection).await?;

        let vector = preferred_embedding(document)?;
        let metadata = metadata_strings(document);
        let text = searchable_text(document);
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO documents (id, collection, document, metadata_json, embedding, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(collection)
        .bind(&text)
        .bind(serde_json::to_string(&metadata)?)
        .bind(embedding::vec_to_blob(&vector))
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        tracing::info!(id = %id, collection, "stored document");
        Ok(id)
    }

    async fn query_by_text(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<QueryMatch>> {
        if !self.collection_exists(collection).await? {
            bail!("Collection '{}' does not exist", collection);
        }

        let provider = embedding::create_provider(&self.embedding)?;
        let query_vec = embedding::embed_query(provider.as_ref(), &self.embedding, query).await?;

        let rows = sqlx::query(
            "SELECT id, document, metadata_json, embedding FROM documents \
             WHERE collection = ? ORDER BY rowid",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut matches: Vec<QueryMatch> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = embedding::blob_to_vec(&blob);
                let similarity = embedding::cosine_similarity(&query_vec, &vector) as f64;
                QueryMatch {
                    id: row.get("id"),
                    document: row.get("document"),
                    metadata: parse_metadata(row.get("metadata_json")),
                    distance: Some(1.0 - similarity),
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        tracing::info!(count = matches.len(), collection, "vector query complete");
        Ok(matches)
    }

    async fn get_document(&self, id: &str, collection: &str) -> Result<Option<StoredDocument>> {
        let row = sqlx::query(
            "SELECT id, document, metadata_json FROM documents WHERE id = ? AND collection = ?",
        )
        .bind(id)
        .bind(collection)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| StoredDocument {
            id: row.get("id"),
            document: row.get("document"),
            metadata: parse_metadata(row.get("metadata_json")),
        }))
    }

    async fn get_all_documents(&self, collection: &str) -> Result<CollectionDump> {
        let rows = sqlx::query(
            "SELECT id, document, metadata_json FROM documents \
             WHERE collection = ? ORDER BY rowid",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut dump = CollectionDump::default();
        for row in &rows {
            dump.ids.push(row.get("id"));
            dump.documents.push(row.get("document"));
            dump.metadatas.push(parse_metadata(row.get("metadata_json")));
        }

        Ok(dump)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM collections ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM collections WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn delete_document(&self, id: &str, collection: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND collection = ?")
            .bind(id)
            .bind(collection)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(id, collection, "deleted document");
        }
        Ok(deleted)
    }

    fn supports_vector_query(&self) -> bool {
        self.embedding.is_enabled()
    }
}

fn parse_metadata(raw: String) -> HashMap<String, String> {
    serde_json::from_str(&raw).unwrap_or_default()
}
