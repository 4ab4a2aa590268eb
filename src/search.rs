//! Document search and ranking.
//!
//! Two mutually exclusive scoring strategies, selected by a capability
//! check on the store — never by catching a failure:
//!
//! - **Vector** — delegate to the store's nearest-neighbor query and convert
//!   each returned cosine distance `d` into a similarity `1 - d`. Matches
//!   without a distance score `null` and sort after scored ones.
//! - **Keyword** — deterministic lexical overlap: per query term, +2 when it
//!   appears in the document body, +3 in the title, +2 in the description;
//!   zero-score candidates are dropped, scores are `raw / 10.0` rounded to
//!   three decimals, ties keep storage order.
//!
//! The vector path degrades to the keyword path within the same call when
//! the underlying query fails (model unreachable, say); only a hard failure
//! to reach the store at all is reported, and then as a structured
//! `success: false` outcome rather than an error.

use crate::models::{SearchHit, SearchOutcome};
use crate::store::{CollectionDump, DocumentStore};

/// Maximum snippet length before truncation.
const SNIPPET_LIMIT: usize = 200;

/// Per-term points for a match in the document body.
const BODY_POINTS: u32 = 2;
/// Per-term points for a match in the title.
const TITLE_POINTS: u32 = 3;
/// Per-term points for a match in the description.
const DESCRIPTION_POINTS: u32 = 2;

/// Divisor normalizing raw keyword scores for reporting.
const SCORE_SCALE: f64 = 10.0;

/// The scoring strategy applied to a search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Native nearest-neighbor query through the store.
    Vector,
    /// Deterministic keyword-overlap fallback.
    Keyword,
}

/// Search a collection, choosing the strategy by store capability.
///
/// Preconditions (enforced at the transports): `query` is non-empty and
/// `1 <= limit <= 20`.
pub async fn search_collection(
    store: &dyn DocumentStore,
    query: &str,
    collection: &str,
    limit: usize,
) -> SearchOutcome {
    let strategy = if store.supports_vector_query() {
        Strategy::Vector
    } else {
        Strategy::Keyword
    };
    search_with_strategy(store, strategy, query, collection, limit).await
}

/// Search a collection with an explicit strategy.
pub async fn search_with_strategy(
    store: &dyn DocumentStore,
    strategy: Strategy,
    query: &str,
    collection: &str,
    limit: usize,
) -> SearchOutcome {
    match store.collection_exists(collection).await {
        Ok(true) => {}
        Ok(false) => {
            return SearchOutcome::empty(
                query,
                format!("Collection '{}' does not exist", collection),
            );
        }
        Err(e) => {
            return SearchOutcome::failure(query, format!("Vector store unavailable: {}", e));
        }
    }

    match strategy {
        Strategy::Vector => match store.query_by_text(query, collection, limit).await {
            Ok(matches) if matches.is_empty() => {
                SearchOutcome::empty(query, "No documents found in collection")
            }
            Ok(matches) => {
                let mut scored: Vec<SearchHit> = Vec::new();
                let mut unscored: Vec<SearchHit> = Vec::new();

                for m in matches {
                    let hit = SearchHit {
                        id: m.id,
                        title: m.metadata.get("title").cloned().unwrap_or_default(),
                        url: m.metadata.get("url").cloned().unwrap_or_default(),
                        content_snippet: make_snippet(
                            m.metadata.get("content").map(String::as_str).unwrap_or(""),
                        ),
                        similarity_score: m.distance.map(|d| round3(1.0 - d)),
                    };
                    if hit.similarity_score.is_some() {
                        scored.push(hit);
                    } else {
                        unscored.push(hit);
                    }
                }

                scored.extend(unscored);
                SearchOutcome::hits(query, scored)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "vector query failed, falling back to keyword scoring"
                );
                keyword_search(store, query, collection, limit).await
            }
        },
        Strategy::Keyword => keyword_search(store, query, collection, limit).await,
    }
}

async fn keyword_search(
    store: &dyn DocumentStore,
    query: &str,
    collection: &str,
    limit: usize,
) -> SearchOutcome {
    let dump = match store.get_all_documents(collection).await {
        Ok(dump) => dump,
        Err(e) => {
            return SearchOutcome::failure(query, format!("Vector store unavailable: {}", e));
        }
    };

    if dump.ids.is_empty() {
        return SearchOutcome::empty(query, "No documents found in collection");
    }

    SearchOutcome::hits(query, rank_by_keywords(&dump, query, limit))
}

/// Score and rank a collection dump against a query.
///
/// Query terms are whitespace-split and lowercased; a repeated term scores
/// on every occurrence. Candidates with a zero raw score are excluded.
/// Sorting is stable descending by raw score, so ties keep storage order.
fn rank_by_keywords(dump: &CollectionDump, query: &str, limit: usize) -> Vec<SearchHit> {
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower.split_whitespace().collect();
    if terms.is_empty() {
        return Vec::new();
    }

    struct Scored {
        raw: u32,
        hit: SearchHit,
    }

    let mut scored: Vec<Scored> = Vec::new();

    for (i, id) in dump.ids.iter().enumerate() {
        let metadata = &dump.metadatas[i];
        let body = metadata
            .get("content")
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        let title = metadata
            .get("title")
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        let description = metadata
            .get("description")
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        let mut raw = 0u32;
        for term in &terms {
            if body.contains(term) {
                raw += BODY_POINTS;
            }
            if title.contains(term) {
                raw += TITLE_POINTS;
            }
            if description.contains(term) {
                raw += DESCRIPTION_POINTS;
            }
        }

        if raw == 0 {
            continue;
        }

        scored.push(Scored {
            raw,
            hit: SearchHit {
                id: id.clone(),
                title: metadata.get("title").cloned().unwrap_or_default(),
                url: metadata.get("url").cloned().unwrap_or_default(),
                content_snippet: make_snippet(
                    metadata.get("content").map(String::as_str).unwrap_or(""),
                ),
                similarity_score: Some(round3(f64::from(raw) / SCORE_SCALE)),
            },
        });
    }

    // Vec::sort_by is stable: equal raw scores keep their storage order.
    scored.sort_by(|a, b| b.raw.cmp(&a.raw));
    scored.truncate(limit);

    scored.into_iter().map(|s| s.hit).collect()
}

/// Truncate a document body to a 200-character snippet.
///
/// Bodies longer than the limit get a literal `"..."` suffix; shorter (or
/// exactly 200-character) bodies are returned unchanged.
fn make_snippet(body: &str) -> String {
    if body.chars().count() > SNIPPET_LIMIT {
        let truncated: String = body.chars().take(SNIPPET_LIMIT).collect();
        format!("{}...", truncated)
    } else {
        body.to_string()
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;

    fn sample_doc(title: &str, description: &str, content: &str, vector: Vec<f32>) -> serde_json::Value {
        json!({
            "title": title,
            "url": format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
            "description": description,
            "content": content,
            "embeddings": { "content_embedding": vector }
        })
    }

    async fn keyword_corpus() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .add_document(
                &sample_doc(
                    "Python Vector Search",
                    "Learn similarity matching",
                    "This tutorial covers vector databases.",
                    vec![1.0, 0.0],
                ),
                "scraped_content",
            )
            .await
            .unwrap();
        store
            .add_document(
                &sample_doc(
                    "Machine Learning APIs",
                    "Building ML services",
                    "Deploy models as REST APIs with a tutorial walkthrough.",
                    vec![0.0, 1.0],
                ),
                "scraped_content",
            )
            .await
            .unwrap();
        store
            .add_document(
                &sample_doc(
                    "Gardening Basics",
                    "Soil and seeds",
                    "How to grow vegetables at home.",
                    vec![0.5, 0.5],
                ),
                "scraped_content",
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn keyword_scoring_matches_contract() {
        let store = keyword_corpus().await;
        let outcome =
            search_collection(&store, "python tutorial", "scraped_content", 5).await;

        assert!(outcome.success);
        assert_eq!(outcome.count, 2);
        // "python" in title (+3), "tutorial" in body (+2) => 0.5
        assert_eq!(outcome.results[0].title, "Python Vector Search");
        assert_eq!(outcome.results[0].similarity_score, Some(0.5));
        // "tutorial" in body only (+2) => 0.2
        assert_eq!(outcome.results[1].title, "Machine Learning APIs");
        assert_eq!(outcome.results[1].similarity_score, Some(0.2));
    }

    #[tokio::test]
    async fn non_matching_documents_are_excluded() {
        let store = keyword_corpus().await;
        let outcome = search_collection(&store, "python", "scraped_content", 5).await;

        assert!(outcome
            .results
            .iter()
            .all(|hit| hit.title != "Gardening Basics"));
    }

    #[tokio::test]
    async fn term_can_score_in_all_three_fields() {
        let store = MemoryStore::new();
        store
            .add_document(
                &sample_doc("alpha", "alpha", "alpha", vec![1.0]),
                "c",
            )
            .await
            .unwrap();

        let outcome = search_collection(&store, "alpha", "c", 5).await;
        // 2 + 3 + 2 = 7 points
        assert_eq!(outcome.results[0].similarity_score, Some(0.7));
    }

    #[tokio::test]
    async fn repeated_terms_score_independently() {
        let store = MemoryStore::new();
        store
            .add_document(&sample_doc("alpha", "x", "y", vec![1.0]), "c")
            .await
            .unwrap();

        let outcome = search_collection(&store, "alpha alpha", "c", 5).await;
        // Title matched twice: 3 + 3 = 6 points
        assert_eq!(outcome.results[0].similarity_score, Some(0.6));
    }

    #[tokio::test]
    async fn ties_keep_storage_order() {
        let store = MemoryStore::new();
        for name in ["first", "second", "third"] {
            store
                .add_document(
                    &sample_doc(name, "none", "shared term here", vec![1.0]),
                    "c",
                )
                .await
                .unwrap();
        }

        let outcome = search_collection(&store, "shared", "c", 5).await;
        let titles: Vec<&str> = outcome.results.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn results_respect_limit() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store
                .add_document(
                    &sample_doc(&format!("doc{}", i), "d", "common text", vec![1.0]),
                    "c",
                )
                .await
                .unwrap();
        }

        let outcome = search_collection(&store, "common", "c", 3).await;
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.results.len(), 3);
    }

    #[tokio::test]
    async fn missing_collection_is_zero_count_success() {
        let store = MemoryStore::new();
        let outcome = search_collection(&store, "anything", "nope", 5).await;

        assert!(outcome.success);
        assert_eq!(outcome.count, 0);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Collection 'nope' does not exist")
        );
    }

    #[tokio::test]
    async fn empty_collection_is_zero_count_success() {
        let store = MemoryStore::new();
        store.get_or_create_collection("empty").await.unwrap();

        let outcome = search_collection(&store, "anything", "empty", 5).await;
        assert!(outcome.success);
        assert_eq!(outcome.count, 0);
        assert_eq!(
            outcome.message.as_deref(),
            Some("No documents found in collection")
        );
    }

    #[tokio::test]
    async fn vector_strategy_converts_distance_to_similarity() {
        let mut query_vectors = HashMap::new();
        query_vectors.insert("tutorial".to_string(), vec![1.0, 0.0]);
        let store = MemoryStore::with_query_embeddings(query_vectors);

        store
            .add_document(
                &sample_doc("Aligned", "d", "body", vec![1.0, 0.0]),
                "c",
            )
            .await
            .unwrap();
        store
            .add_document(
                &sample_doc("Orthogonal", "d", "body", vec![0.0, 1.0]),
                "c",
            )
            .await
            .unwrap();

        let outcome = search_collection(&store, "tutorial", "c", 5).await;
        assert!(outcome.success);
        assert_eq!(outcome.results[0].title, "Aligned");
        assert_eq!(outcome.results[0].similarity_score, Some(1.0));
        assert_eq!(outcome.results[1].similarity_score, Some(0.0));
    }

    #[tokio::test]
    async fn vector_failure_falls_back_to_keyword() {
        // Vector-capable store, but the query text has no fixture embedding,
        // so the nearest-neighbor call fails like an unreachable model.
        let store = MemoryStore::with_query_embeddings(HashMap::new());
        store
            .add_document(
                &sample_doc("Python Guide", "d", "a tutorial body", vec![1.0]),
                "c",
            )
            .await
            .unwrap();

        let outcome = search_collection(&store, "python", "c", 5).await;
        assert!(outcome.success);
        assert_eq!(outcome.count, 1);
        // Keyword score, not a cosine similarity: title match only.
        assert_eq!(outcome.results[0].similarity_score, Some(0.3));
    }

    #[test]
    fn snippet_truncates_at_200_chars() {
        let body = "y".repeat(250);
        let snippet = make_snippet(&body);
        assert_eq!(snippet.chars().count(), 203);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn snippet_of_exactly_200_chars_has_no_ellipsis() {
        let body = "y".repeat(200);
        assert_eq!(make_snippet(&body), body);
    }

    #[test]
    fn snippet_of_empty_body_is_empty() {
        assert_eq!(make_snippet(""), "");
    }

    #[test]
    fn keyword_scores_are_monotonic_in_matches() {
        let mut dump = CollectionDump::default();
        for (i, content) in ["one", "one two", "one two three"].iter().enumerate() {
            dump.ids.push(format!("d{}", i));
            dump.documents.push(content.to_string());
            let mut metadata = HashMap::new();
            metadata.insert("title".to_string(), String::new());
            metadata.insert("description".to_string(), String::new());
            metadata.insert("content".to_string(), content.to_string());
            dump.metadatas.push(metadata);
        }

        let hits = rank_by_keywords(&dump, "one two three", 10);
        assert_eq!(hits[0].id, "d2");
        assert_eq!(hits[0].similarity_score, Some(0.6));
        assert_eq!(hits[1].id, "d1");
        assert_eq!(hits[1].similarity_score, Some(0.4));
        assert_eq!(hits[2].id, "d0");
        assert_eq!(hits[2].similarity_score, Some(0.2));
    }

    #[test]
    fn empty_query_yields_no_results() {
        let mut dump = CollectionDump::default();
        dump.ids.push("d0".to_string());
        dump.documents.push("text".to_string());
        dump.metadatas.push(HashMap::new());

        assert!(rank_by_keywords(&dump, "   ", 10).is_empty());
    }
}
