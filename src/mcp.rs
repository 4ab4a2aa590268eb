//! MCP JSON-RPC tool server.
//!
//! Exposes a single `search_website` tool over the Model Context Protocol
//! (stdio transport) so MCP clients can run semantic searches against the
//! scraped-content store. Successful searches return a human-readable
//! summary followed by the raw JSON payload; a missing `query` argument
//! returns a structured error payload as tool text rather than a protocol
//! error.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};

use crate::config::Config;
use crate::models::SearchOutcome;
use crate::search;
use crate::store::SqliteStore;

/// Default result limit when the tool call omits one.
const DEFAULT_LIMIT: usize = 5;
/// Maximum allowed result limit.
const MAX_LIMIT: usize = 20;

/// MCP server handler owning the shared store connection.
///
/// Each MCP session receives a clone of this struct (everything is behind
/// `Arc`), so all sessions share the same store.
#[derive(Clone)]
pub struct SearchServer {
    config: Arc<Config>,
    store: Arc<SqliteStore>,
}

impl SearchServer {
    pub fn new(config: Arc<Config>, store: Arc<SqliteStore>) -> Self {
        Self { config, store }
    }

    fn search_tool() -> Tool {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query text to find similar content"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 5, max: 20)",
                    "minimum": 1,
                    "maximum": 20,
                    "default": DEFAULT_LIMIT
                },
                "collection": {
                    "type": "string",
                    "description": "Database collection name (default: 'scraped_content')",
                    "default": "scraped_content"
                }
            },
            "required": ["query"]
        });

        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> = match schema {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Borrowed("search_website"),
            title: None,
            description: Some(Cow::Borrowed(
                "Search for similar content in the scraped website database using semantic vector search",
            )),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }
}

impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pagedex".to_string(),
                title: Some("pagedex".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Search scraped and indexed web content. Use the search_website tool \
                 with a query string to find semantically similar documents."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(vec![
            Self::search_tool(),
        ])))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        (name == "search_website").then(Self::search_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if request.name != "search_website" {
            return Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            ));
        }

        let args = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let query = args.get("query").and_then(|q| q.as_str()).unwrap_or("");
        if query.trim().is_empty() {
            let payload = serde_json::json!({
                "success": false,
                "error": "Query parameter is required"
            });
            let text = serde_json::to_string_pretty(&payload).unwrap_or_default();
            return Ok(CallToolResult::success(vec![Content::text(text)]));
        }

        // Out-of-range or non-integer limits silently become the default.
        let limit = args
            .get("limit")
            .and_then(|l| l.as_i64())
            .filter(|l| (1..=MAX_LIMIT as i64).contains(l))
            .unwrap_or(DEFAULT_LIMIT as i64) as usize;

        let collection = args
            .get("collection")
            .and_then(|c| c.as_str())
            .unwrap_or(&self.config.store.default_collection);

        let outcome =
            search::search_collection(self.store.as_ref(), query, collection, limit).await;

        Ok(CallToolResult::success(vec![Content::text(format_outcome(
            query, &outcome,
        ))]))
    }
}

/// Render a search outcome as tool text: a numbered human-readable summary
/// plus the raw JSON when there are hits, bare JSON otherwise.
fn format_outcome(query: &str, outcome: &SearchOutcome) -> String {
    let raw = serde_json::to_string_pretty(outcome).unwrap_or_default();

    if !outcome.success || outcome.count == 0 {
        return raw;
    }

    let mut text = format!(
        "Found {} similar document(s) for query: '{}'\n\n",
        outcome.count, query
    );

    for (i, hit) in outcome.results.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, hit.title));
        text.push_str(&format!("   URL: {}\n", hit.url));
        if let Some(score) = hit.similarity_score {
            text.push_str(&format!("   Similarity: {:.3}\n", score));
        }
        if !hit.content_snippet.is_empty() {
            text.push_str(&format!("   Content: {}\n", hit.content_snippet));
        }
        text.push('\n');
    }

    text.push_str("Raw data:\n");
    text.push_str(&raw);
    text
}

/// Run the MCP server over stdio until the client disconnects.
pub async fn run_mcp_server(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::open(config).await?;
    let server = SearchServer::new(Arc::new(config.clone()), Arc::new(store));

    eprintln!("Starting MCP server for pagedex...");

    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchHit;

    #[test]
    fn format_outcome_with_hits_includes_summary_and_raw_json() {
        let outcome = SearchOutcome::hits(
            "python",
            vec![SearchHit {
                id: "abc".to_string(),
                title: "Python Guide".to_string(),
                url: "https://example.com/python".to_string(),
                content_snippet: "A guide.".to_string(),
                similarity_score: Some(0.5),
            }],
        );

        let text = format_outcome("python", &outcome);
        assert!(text.starts_with("Found 1 similar document(s) for query: 'python'"));
        assert!(text.contains("1. Python Guide"));
        assert!(text.contains("Similarity: 0.500"));
        assert!(text.contains("Raw data:"));
        assert!(text.contains("\"similarity_score\": 0.5"));
    }

    #[test]
    fn format_outcome_without_hits_is_bare_json() {
        let outcome = SearchOutcome::empty("x", "No documents found in collection");
        let text = format_outcome("x", &outcome);
        assert!(text.trim_start().starts_with('{'));
        assert!(text.contains("No documents found in collection"));
    }
}
