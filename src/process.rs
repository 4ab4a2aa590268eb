//! Ingestion and query orchestration for the CLI.
//!
//! Ties the pipeline together: parse or scrape input, enrich it with
//! embeddings, optionally store it, and print human-readable reports.
//! Built on the same search core the HTTP and MCP transports use.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::embedding;
use crate::models::SearchOutcome;
use crate::scrape::Scraper;
use crate::search;
use crate::store::{DocumentStore, SqliteStore};

/// Process a JSON document: add embeddings and optionally store it.
///
/// `json_input` is either a path to a JSON file or an inline JSON string —
/// file wins when both parse, matching the CLI contract.
pub async fn run_process(
    config: &Config,
    json_input: &str,
    store_in_db: bool,
    collection: Option<String>,
) -> Result<()> {
    let document = match std::fs::read_to_string(json_input) {
        Ok(content) => {
            let parsed = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in file {}", json_input))?;
            println!("Loaded JSON from file: {}", json_input);
            parsed
        }
        Err(_) => {
            let parsed: serde_json::Value =
                serde_json::from_str(json_input).context("Input is neither a readable file nor valid JSON")?;
            println!("Processing JSON string input");
            parsed
        }
    };

    let result = process_document(config, document, store_in_db, &resolve_collection(config, collection)).await?;

    println!("\nFinal result:");
    println!(
        "{}",
        serde_json::to_string_pretty(&elide_embeddings(&result))?
    );
    Ok(())
}

/// Scrape a URL, then process the result like [`run_process`].
pub async fn run_scrape(
    config: &Config,
    url: &str,
    store_in_db: bool,
    collection: Option<String>,
) -> Result<()> {
    println!("Scraping URL: {}", url);

    let scraper = Scraper::new(&config.scraper)?;
    let page = scraper.scrape(url).await?;
    println!("Successfully scraped webpage");

    let document = serde_json::to_value(&page)?;
    let result = process_document(config, document, store_in_db, &resolve_collection(config, collection)).await?;

    println!("\nFinal result:");
    println!(
        "{}",
        serde_json::to_string_pretty(&elide_embeddings(&result))?
    );
    Ok(())
}

/// Core processing step shared by `process` and `scrape`.
///
/// Adds embeddings to the document's text fields and, when requested,
/// stores it and records the generated id under `database_id`. A storage
/// failure is reported but does not discard the enhanced document.
pub async fn process_document(
    config: &Config,
    document: serde_json::Value,
    store_in_db: bool,
    collection: &str,
) -> Result<serde_json::Value> {
    println!("Adding vector embeddings to text fields...");
    let mut enhanced = embedding::embed_document(&config.embedding, &document).await?;

    let embedded_fields: Vec<String> = enhanced
        .get("embeddings")
        .and_then(|e| e.as_object())
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();

    if embedded_fields.is_empty() {
        println!("No text fields found for embedding");
        return Ok(enhanced);
    }

    println!("Added {} embedding(s) to the JSON data", embedded_fields.len());
    for key in &embedded_fields {
        let dims = enhanced["embeddings"][key]
            .as_array()
            .map(|a| a.len())
            .unwrap_or(0);
        let field = key.trim_end_matches("_embedding");
        println!("   - {}: {}-dimensional vector", field, dims);
    }

    if store_in_db {
        println!("\nStoring in vector database (collection: {})...", collection);
        let store = SqliteStore::open(config).await?;
        match store.add_document(&enhanced, collection).await {
            Ok(id) => {
                println!("Stored in database with ID: {}", id);
                if let Some(map) = enhanced.as_object_mut() {
                    map.insert("database_id".to_string(), serde_json::json!(id));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to store document");
                eprintln!("Failed to store in database: {}", e);
            }
        }
        store.close().await;
    }

    Ok(enhanced)
}

/// Search the store and print ranked results.
pub async fn run_query(
    config: &Config,
    query_text: &str,
    collection: Option<String>,
    limit: usize,
) -> Result<()> {
    println!("Searching for: '{}'", query_text);

    let collection = resolve_collection(config, collection);
    let store = SqliteStore::open(config).await?;
    let outcome = search::search_collection(&store, query_text, &collection, limit).await;
    store.close().await;

    print_outcome(&outcome);

    if !outcome.success {
        anyhow::bail!(
            "{}",
            outcome.error.as_deref().unwrap_or("search failed")
        );
    }
    Ok(())
}

/// List all collections in the store.
pub async fn run_list(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let collections = store.list_collections().await?;
    store.close().await;

    if collections.is_empty() {
        println!("No collections found in database");
    } else {
        println!("Available collections:");
        for collection in &collections {
            println!("  - {}", collection);
        }
    }
    Ok(())
}

fn resolve_collection(config: &Config, collection: Option<String>) -> String {
    collection.unwrap_or_else(|| config.store.default_collection.clone())
}

fn print_outcome(outcome: &SearchOutcome) {
    if outcome.count == 0 {
        match &outcome.message {
            Some(message) => println!("{}", message),
            None => println!("No similar documents found"),
        }
        return;
    }

    println!("\nFound {} similar document(s):", outcome.count);
    for (i, hit) in outcome.results.iter().enumerate() {
        println!("\n{}. Document ID: {}", i + 1, hit.id);
        println!("   Title: {}", hit.title);
        println!("   URL: {}", hit.url);
        if let Some(score) = hit.similarity_score {
            println!("   Similarity score: {:.3}", score);
        }
        if !hit.content_snippet.is_empty() {
            println!("   Content: {}", hit.content_snippet);
        }
    }
}

/// Replace embedding vectors with `<N-dimensional vector>` placeholders for
/// readable CLI output.
fn elide_embeddings(document: &serde_json::Value) -> serde_json::Value {
    let mut display = document.clone();

    if let Some(embeddings) = display.get_mut("embeddings").and_then(|e| e.as_object_mut()) {
        let keys: Vec<String> = embeddings.keys().cloned().collect();
        for key in keys {
            let dims = embeddings[&key].as_array().map(|a| a.len()).unwrap_or(0);
            embeddings.insert(
                key,
                serde_json::json!(format!("<{}-dimensional vector>", dims)),
            );
        }
    }

    display
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn elide_embeddings_replaces_vectors() {
        let doc = json!({
            "title": "t",
            "embeddings": {
                "title_embedding": [0.1, 0.2, 0.3],
            }
        });
        let display = elide_embeddings(&doc);
        assert_eq!(
            display["embeddings"]["title_embedding"],
            json!("<3-dimensional vector>")
        );
        assert_eq!(display["title"], json!("t"));
    }
}
