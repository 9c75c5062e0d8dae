//! Handler for the `web_search` tool.
//!
//! Provider failures never reach the caller as errors: they come back as a
//! result list holding a single error-carrying record, tagged with an
//! `error_code`.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::error::SoftErrorCode;
use crate::search::WebSearchProvider;
use crate::tools::registry::{object_schema, parse_args};
use crate::tools::{ToolContext, ToolFuture, ToolHandler};

/// Upper bound on results requested from the provider.
pub const MAX_RESULTS: usize = 5;

/// One search hit. Every field is optional and provider-specific extras are
/// preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    pub fn from_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchOutput {
    pub result: Vec<SearchResult>,
    /// Set when `result` stands in for a failed or malformed provider call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl WebSearchOutput {
    fn soft(result: Vec<SearchResult>, code: SoftErrorCode) -> Self {
        Self {
            result,
            error_code: Some(code.as_str().to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebSearchArgs {
    query: String,
}

pub struct WebSearchHandler {
    provider: Arc<dyn WebSearchProvider>,
}

impl WebSearchHandler {
    pub fn new(provider: Arc<dyn WebSearchProvider>) -> Self {
        Self { provider }
    }

    /// Run a search, folding every provider failure into the output.
    pub async fn search(&self, query: &str) -> WebSearchOutput {
        let response = match self.provider.search(query, MAX_RESULTS).await {
            Ok(response) => response,
            Err(e) => {
                let code = SoftErrorCode::SearchFailed;
                warn!(query, error_code = %code, "Web search failed: {:#}", e);
                return WebSearchOutput::soft(
                    vec![SearchResult::from_error(format!(
                        "Search failed for query '{}': {}",
                        query, e
                    ))],
                    code,
                );
            }
        };

        match response.get("results").and_then(Value::as_array) {
            Some(items) => WebSearchOutput {
                result: items.iter().map(to_search_result).collect(),
                error_code: None,
            },
            None => {
                let code = SoftErrorCode::MissingResults;
                warn!(query, error_code = %code, "Web search response has no results field");
                WebSearchOutput::soft(Vec::new(), code)
            }
        }
    }
}

// Items that do not fit the schema are kept as error records rather than dropped.
fn to_search_result(item: &Value) -> SearchResult {
    serde_json::from_value(item.clone()).unwrap_or_else(|e| {
        SearchResult::from_error(format!("Malformed search result: {}", e))
    })
}

impl ToolHandler for WebSearchHandler {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Use this tool to search the web for information using the Tavily API."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(&[(
            "query",
            json!({ "type": "string", "description": "The search query." }),
        )])
    }

    fn output_schema(&self) -> Option<JsonObject> {
        let mut schema = object_schema(&[(
            "result",
            json!({
                "type": "array",
                "description": "A list of search results",
                "items": {
                    "type": "object",
                    "properties": {
                        "url": { "type": "string" },
                        "title": { "type": "string" },
                        "content": { "type": "string" },
                        "score": { "type": "number" },
                        "raw_content": { "type": "string" },
                        "error": { "type": "string" },
                    },
                    "additionalProperties": true,
                },
            }),
        )]);
        if let Some(Value::Object(props)) = schema.get_mut("properties") {
            props.insert("error_code".to_string(), json!({ "type": "string" }));
        }
        Some(schema)
    }

    fn execute(&self, args: JsonObject, _ctx: &ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: WebSearchArgs = parse_args(args)?;
            let output = self.search(&args.query).await;

            let structured = serde_json::to_value(&output)
                .map_err(|e| crate::error::ToolError::Internal(e.to_string()))?;
            Ok(CallToolResult {
                content: vec![Content::text(structured.to_string())],
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
    use std::sync::Mutex;

    enum Reply {
        Ok(Value),
        Fail(&'static str),
    }

    struct FakeSearch {
        reply: Reply,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl FakeSearch {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl WebSearchProvider for FakeSearch {
        fn search(&self, query: &str, max_results: usize) -> ProviderFuture<'_, Value> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), max_results));
            let out = match &self.reply {
                Reply::Ok(v) => Ok(v.clone()),
                Reply::Fail(msg) => Err(anyhow::anyhow!(*msg)),
            };
            Box::pin(async move { out })
        }
    }

    #[tokio::test]
    async fn test_maps_results_and_caps_request() {
        let fake = FakeSearch::new(Reply::Ok(json!({
            "query": "rust",
            "results": [
                {
                    "url": "https://www.rust-lang.org",
                    "title": "Rust",
                    "content": "A language",
                    "score": 0.98,
                    "raw_content": null,
                    "favicon": "https://www.rust-lang.org/favicon.ico"
                },
                { "title": "Only a title" }
            ]
        })));
        let handler = WebSearchHandler::new(fake.clone());

        let output = handler.search("rust").await;
        assert_eq!(output.error_code, None);
        assert_eq!(output.result.len(), 2);
        assert_eq!(output.result[0].url.as_deref(), Some("https://www.rust-lang.org"));
        assert_eq!(output.result[0].score, Some(0.98));
        assert_eq!(
            output.result[0].extra.get("favicon"),
            Some(&json!("https://www.rust-lang.org/favicon.ico"))
        );
        assert_eq!(output.result[1].title.as_deref(), Some("Only a title"));
        assert_eq!(output.result[1].url, None);

        let calls = fake.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("rust".to_string(), MAX_RESULTS)]);
    }

    #[tokio::test]
    async fn test_missing_results_field_is_empty_list() {
        let handler = WebSearchHandler::new(FakeSearch::new(Reply::Ok(json!({ "answer": "42" }))));
        let output = handler.search("anything").await;
        assert!(output.result.is_empty());
        assert_eq!(output.error_code.as_deref(), Some("missing_results"));
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_error_record() {
        let handler = WebSearchHandler::new(FakeSearch::new(Reply::Fail("connection refused")));
        let output = handler.search("rust async").await;

        assert_eq!(output.result.len(), 1);
        let error = output.result[0].error.as_deref().unwrap();
        assert!(error.contains("'rust async'"));
        assert!(error.contains("connection refused"));
        assert_eq!(output.error_code.as_deref(), Some("search_failed"));
    }

    #[tokio::test]
    async fn test_execute_never_errors_on_provider_failure() {
        let handler = WebSearchHandler::new(FakeSearch::new(Reply::Fail("timeout")));
        let mut args = JsonObject::new();
        args.insert("query".to_string(), json!("q"));

        let result = handler.execute(args, &ToolContext::default()).await.unwrap();
        assert_eq!(result.is_error, Some(false));
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["result"].as_array().unwrap().len(), 1);
        assert_eq!(structured["error_code"], "search_failed");
    }

    #[test]
    fn test_clean_output_omits_error_fields() {
        let output = WebSearchOutput {
            result: vec![SearchResult {
                url: Some("https://example.com".into()),
                ..Default::default()
            }],
            error_code: None,
        };
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value, json!({ "result": [{ "url": "https://example.com" }] }));
    }
}
