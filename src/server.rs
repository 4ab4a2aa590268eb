//! HTTP API server.
//!
//! REST interface over the search pipeline, complementing the MCP tool
//! server. All responses are JSON.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | API information |
//! | `GET`  | `/health` | Health check |
//! | `POST` | `/search` | Search with a JSON body |
//! | `GET`  | `/search_query` | Search with query parameters |
//! | `GET`  | `/collections` | List collections |
//!
//! # Validation
//!
//! `query` must be non-empty and `limit` must be within `[1, 20]`
//! (default 5); violations are 400 responses. Search outcomes — including
//! `success: false` envelopes for store failures — are returned verbatim
//! with status 200; a 500 is produced only when no structured envelope
//! exists (e.g. the collections listing fails).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::models::SearchOutcome;
use crate::search;
use crate::store::{DocumentStore, SqliteStore};

/// Default result limit when a request omits one.
const DEFAULT_LIMIT: usize = 5;
/// Maximum allowed result limit.
const MAX_LIMIT: usize = 20;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<SqliteStore>,
}

/// Start the HTTP API server on the configured bind address.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let store = SqliteStore::open(config).await?;

    let state = AppState {
        config: Arc::new(config.clone()),
        store: Arc::new(store),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/search", post(handle_search))
        .route("/search_query", get(handle_search_query))
        .route("/collections", get(handle_collections))
        .layer(cors)
        .with_state(state);

    println!("API server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "detail": self.message });
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

// ============ Requests ============

/// Body for `POST /search`.
#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    limit: Option<usize>,
    collection: Option<String>,
}

/// Query parameters for `GET /search_query`.
#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    limit: Option<usize>,
    collection: Option<String>,
}

fn validate(query: &str, limit: Option<usize>) -> Result<usize, AppError> {
    if query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 1 || limit > MAX_LIMIT {
        return Err(bad_request(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    Ok(limit)
}

// ============ Handlers ============

async fn handle_root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "pagedex API",
        "description": "Search scraped website content using vector similarity",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/search": "POST - Search with JSON body",
            "/search_query": "GET - Search with query parameters",
            "/collections": "GET - List collections",
            "/health": "GET - Health check"
        }
    }))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "pagedex-api" }))
}

async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, AppError> {
    let limit = validate(&request.query, request.limit)?;
    let collection = request
        .collection
        .unwrap_or_else(|| state.config.store.default_collection.clone());

    let outcome =
        search::search_collection(state.store.as_ref(), &request.query, &collection, limit).await;
    Ok(Json(outcome))
}

async fn handle_search_query(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchOutcome>, AppError> {
    let limit = validate(&params.query, params.limit)?;
    let collection = params
        .collection
        .unwrap_or_else(|| state.config.store.default_collection.clone());

    let outcome =
        search::search_collection(state.store.as_ref(), &params.query, &collection, limit).await;
    Ok(Json(outcome))
}

async fn handle_collections(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let collections = state
        .store
        .list_collections()
        .await
        .map_err(|e| internal_error(format!("Failed to list collections: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "collections": collections,
        "count": collections.len()
    })))
}
