//! Handler for the `get_docs_from_web` tool.
//!
//! Searches one of a fixed set of documentation sites, then fetches and
//! converts every hit to text. Search and fetch failures degrade into a
//! descriptive string; only an unsupported library is a hard error.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{SoftErrorCode, ToolError, ToolResult};
use crate::search::{DocsSearchProvider, PageConverter};
use crate::tools::registry::{object_schema, parse_args};
use crate::tools::{ToolContext, ToolFuture, ToolHandler};

/// Documentation sites the tool can search, keyed by library name.
pub const DOCS_LIBRARIES: [(&str, &str); 4] = [
    ("langchain", "https://python.langchain.com/docs/"),
    ("llama_index", "https://docs.llamaindex.ai/en/stable/"),
    ("mcp", "https://mcp.readthedocs.io/en/latest/"),
    ("openai", "https://platform.openai.com/docs/"),
];

const UNTITLED: &str = "Untitled";

/// Look up the documentation root for `library`.
pub fn docs_url(library: &str) -> ToolResult<&'static str> {
    DOCS_LIBRARIES
        .iter()
        .find(|(name, _)| *name == library)
        .map(|(_, url)| *url)
        .ok_or_else(|| {
            let supported: Vec<&str> = DOCS_LIBRARIES.iter().map(|(name, _)| *name).collect();
            ToolError::invalid_argument(format!(
                "Library '{}' not supported by this tool. Supported libraries: {}",
                library,
                supported.join(", ")
            ))
        })
}

/// A fetched documentation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRecord {
    pub source: String,
    pub content: String,
    pub title: String,
}

/// What a docs lookup produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DocsOutcome {
    Found(Vec<DocRecord>),
    /// A descriptive message standing in for a failed or empty lookup.
    Soft { message: String, code: SoftErrorCode },
}

#[derive(Debug, Deserialize)]
struct DocsArgs {
    query: String,
    library: String,
}

#[derive(Debug, Deserialize)]
struct OrganicHit {
    link: Option<String>,
    title: Option<String>,
}

pub struct DocsSearchHandler {
    search: Arc<dyn DocsSearchProvider>,
    converter: Arc<dyn PageConverter>,
    fetch_concurrency: usize,
}

impl DocsSearchHandler {
    pub fn new(search: Arc<dyn DocsSearchProvider>, converter: Arc<dyn PageConverter>) -> Self {
        Self {
            search,
            converter,
            fetch_concurrency: 1,
        }
    }

    /// Fetch up to `n` pages at a time. Results keep search order.
    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n.max(1);
        self
    }

    pub async fn get_docs(&self, query: &str, library: &str) -> ToolResult<DocsOutcome> {
        let base = docs_url(library)?;
        let scoped = format!("site: {} {}", base, query);

        let hits = match self.search.search(&scoped).await {
            Ok(response) => organic_hits(&response),
            Err(e) => {
                warn!(query = %scoped, "Docs search failed: {:#}", e);
                Vec::new()
            }
        };

        if hits.is_empty() {
            return Ok(soft(
                format!("No results found for query: {}", scoped),
                SoftErrorCode::NoResults,
            ));
        }

        let fetches = hits
            .into_iter()
            .filter_map(|hit| Some((hit.link?, hit.title)))
            .map(|(url, title)| self.fetch(url, title));
        let docs: Vec<DocRecord> = stream::iter(fetches)
            .buffered(self.fetch_concurrency)
            .filter_map(future::ready)
            .collect()
            .await;

        if docs.is_empty() {
            return Ok(soft(
                format!("No content could be extracted for query: {}", scoped),
                SoftErrorCode::NoContent,
            ));
        }

        info!(query = %scoped, pages = docs.len(), "Docs search complete");
        Ok(DocsOutcome::Found(docs))
    }

    async fn fetch(&self, url: String, title: Option<String>) -> Option<DocRecord> {
        match self.converter.convert(&url).await {
            Ok(content) if !content.is_empty() => Some(DocRecord {
                source: url,
                content,
                title: title.unwrap_or_else(|| UNTITLED.to_string()),
            }),
            Ok(_) => {
                warn!(url = %url, "Page produced no content");
                None
            }
            Err(e) => {
                warn!(url = %url, "Failed to process page: {:#}", e);
                None
            }
        }
    }
}

fn soft(message: String, code: SoftErrorCode) -> DocsOutcome {
    warn!(error_code = %code, "{}", message);
    DocsOutcome::Soft { message, code }
}

fn organic_hits(response: &Value) -> Vec<OrganicHit> {
    response
        .get("organic")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

impl ToolHandler for DocsSearchHandler {
    fn name(&self) -> &str {
        "get_docs_from_web"
    }

    fn description(&self) -> &str {
        "Search the docs for a given query and library. \
         Supports libraries: langchain, llama_index, mcp, openai."
    }

    fn input_schema(&self) -> JsonObject {
        let libraries: Vec<&str> = DOCS_LIBRARIES.iter().map(|(name, _)| *name).collect();
        object_schema(&[
            (
                "query",
                json!({
                    "type": "string",
                    "description": "The query to search for (e.g. \"how to use chains\").",
                }),
            ),
            (
                "library",
                json!({
                    "type": "string",
                    "description": "The library to search (e.g. \"langchain\").",
                    "enum": libraries,
                }),
            ),
        ])
    }

    fn execute(&self, args: JsonObject, _ctx: &ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: DocsArgs = parse_args(args)?;

            let (content, structured) = match self.get_docs(&args.query, &args.library).await? {
                DocsOutcome::Found(docs) => {
                    let content = docs
                        .iter()
                        .map(|doc| {
                            serde_json::to_string(doc)
                                .map(Content::text)
                                .map_err(|e| ToolError::Internal(e.to_string()))
                        })
                        .collect::<ToolResult<Vec<_>>>()?;
                    (content, json!({ "result": docs }))
                }
                DocsOutcome::Soft { message, code } => (
                    vec![Content::text(message.clone())],
                    json!({ "result": message, "error_code": code.as_str() }),
                ),
            };

            Ok(CallToolResult {
                content,
                structured_content: Some(structured),
                is_error: Some(false),
                meta: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ProviderFuture;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeSearch {
        response: Option<Value>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeSearch {
        fn returning(response: Option<Value>) -> Arc<Self> {
            Arc::new(Self {
                response,
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    impl DocsSearchProvider for FakeSearch {
        fn search(&self, query: &str) -> ProviderFuture<'_, Value> {
            self.queries.lock().unwrap().push(query.to_string());
            let out = self
                .response
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Error: 500 - Internal Server Error"));
            Box::pin(async move { out })
        }
    }

    /// Converter serving canned pages; unknown URLs fail.
    struct FakePages {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakePages {
        fn new(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(u, c)| (u.to_string(), c.to_string()))
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            })
        }
    }

    impl PageConverter for FakePages {
        fn convert(&self, url: &str) -> ProviderFuture<'_, String> {
            self.fetched.lock().unwrap().push(url.to_string());
            let out = self
                .pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404 for {}", url));
            Box::pin(async move { out })
        }
    }

    #[tokio::test]
    async fn test_unsupported_library_lists_supported() {
        let handler = DocsSearchHandler::new(FakeSearch::returning(None), FakePages::new(&[]));
        let err = handler.get_docs("chains", "unsupported").await.unwrap_err();
        match err {
            ToolError::InvalidArgument(msg) => {
                assert!(msg.contains("'unsupported'"));
                assert!(msg.contains("langchain, llama_index, mcp, openai"));
            }
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_organic_results_is_no_results_string() {
        let search = FakeSearch::returning(Some(json!({ "organic": [] })));
        let handler = DocsSearchHandler::new(search.clone(), FakePages::new(&[]));

        let outcome = handler.get_docs("chains", "langchain").await.unwrap();
        assert_eq!(
            outcome,
            DocsOutcome::Soft {
                message: "No results found for query: site: https://python.langchain.com/docs/ chains"
                    .to_string(),
                code: SoftErrorCode::NoResults,
            }
        );
        assert_eq!(
            search.queries.lock().unwrap().as_slice(),
            &["site: https://python.langchain.com/docs/ chains".to_string()]
        );
    }

    #[tokio::test]
    async fn test_search_failure_is_no_results() {
        let handler = DocsSearchHandler::new(FakeSearch::returning(None), FakePages::new(&[]));
        let outcome = handler.get_docs("agents", "openai").await.unwrap();
        assert!(matches!(
            outcome,
            DocsOutcome::Soft { code: SoftErrorCode::NoResults, .. }
        ));
    }

    #[tokio::test]
    async fn test_fetches_pages_in_order_and_skips_failures() {
        let search = FakeSearch::returning(Some(json!({
            "organic": [
                { "link": "https://mcp.readthedocs.io/a", "title": "A" },
                { "title": "no link" },
                { "link": "https://mcp.readthedocs.io/broken", "title": "Broken" },
                { "link": "https://mcp.readthedocs.io/b" }
            ]
        })));
        let pages = FakePages::new(&[
            ("https://mcp.readthedocs.io/a", "page a"),
            ("https://mcp.readthedocs.io/b", "page b"),
        ]);
        let handler = DocsSearchHandler::new(search, pages.clone()).with_fetch_concurrency(2);

        let outcome = handler.get_docs("tools", "mcp").await.unwrap();
        assert_eq!(
            outcome,
            DocsOutcome::Found(vec![
                DocRecord {
                    source: "https://mcp.readthedocs.io/a".to_string(),
                    content: "page a".to_string(),
                    title: "A".to_string(),
                },
                DocRecord {
                    source: "https://mcp.readthedocs.io/b".to_string(),
                    content: "page b".to_string(),
                    title: "Untitled".to_string(),
                },
            ])
        );
        assert_eq!(pages.fetched.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_no_content_string_when_every_fetch_fails() {
        let search = FakeSearch::returning(Some(json!({
            "organic": [{ "link": "https://docs.llamaindex.ai/x", "title": "X" }]
        })));
        let pages = FakePages::new(&[("https://docs.llamaindex.ai/x", "")]);
        let handler = DocsSearchHandler::new(search, pages);

        match handler.get_docs("index", "llama_index").await.unwrap() {
            DocsOutcome::Soft { message, code } => {
                assert!(message.starts_with("No content could be extracted for query: "));
                assert_eq!(code, SoftErrorCode::NoContent);
            }
            other => panic!("expected soft outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_returns_string_for_soft_outcome() {
        let handler = DocsSearchHandler::new(
            FakeSearch::returning(Some(json!({}))),
            FakePages::new(&[]),
        );
        let mut args = JsonObject::new();
        args.insert("query".to_string(), json!("chains"));
        args.insert("library".to_string(), json!("langchain"));

        let result = handler.execute(args, &ToolContext::default()).await.unwrap();
        let structured = result.structured_content.unwrap();
        assert!(structured["result"].as_str().unwrap().starts_with("No results found"));
        assert_eq!(structured["error_code"], "no_results");
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_library() {
        let handler = DocsSearchHandler::new(FakeSearch::returning(None), FakePages::new(&[]));
        let mut args = JsonObject::new();
        args.insert("query".to_string(), json!("chains"));
        args.insert("library".to_string(), json!("django"));

        let err = handler.execute(args, &ToolContext::default()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}
