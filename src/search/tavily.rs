//! Tavily search API client.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use super::{ProviderFuture, USER_AGENT, WebSearchProvider};

pub const TAVILY_URL: &str = "https://api.tavily.com/search";

pub struct TavilyClient {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, TAVILY_URL)
    }

    /// Point the client at a different endpoint (proxies, local mocks).
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client,
        })
    }

    async fn post_search(&self, query: &str, max_results: usize) -> Result<Value> {
        debug!(query, max_results, "Sending Tavily search");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query": query,
                "max_results": max_results,
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }
}

impl WebSearchProvider for TavilyClient {
    fn search(&self, query: &str, max_results: usize) -> ProviderFuture<'_, Value> {
        let query = query.to_string();
        Box::pin(async move { self.post_search(&query, max_results).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::mock_server::MockServer;
    use crate::tools::WebSearchHandler;
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_search_sends_bearer_key_and_max_results() {
        let server = MockServer::spawn(
            StatusCode::OK,
            json!({ "results": [{ "title": "Rust", "url": "https://www.rust-lang.org" }] }),
        )
        .await;
        let client = TavilyClient::with_endpoint("tvly-secret", server.url("/search")).unwrap();

        let response = client.search("rust language", 5).await.unwrap();
        assert_eq!(response["results"][0]["title"], "Rust");

        let captured = server.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(
            captured[0].body,
            json!({ "query": "rust language", "max_results": 5 })
        );
        assert_eq!(captured[0].headers["authorization"], "Bearer tvly-secret");
    }

    #[tokio::test]
    async fn test_error_status_becomes_soft_search_failure() {
        let server = MockServer::spawn(StatusCode::UNAUTHORIZED, json!({ "detail": "bad key" })).await;
        let client = TavilyClient::with_endpoint("tvly-wrong", server.url("/search")).unwrap();
        assert!(client.search("rust", 5).await.is_err());

        let handler = WebSearchHandler::new(Arc::new(client));
        let output = handler.search("rust").await;
        assert_eq!(output.error_code.as_deref(), Some("search_failed"));
        assert_eq!(output.result.len(), 1);
        let error = output.result[0].error.as_deref().unwrap();
        assert!(error.starts_with("Search failed for query 'rust': "));
        assert!(error.contains("401"));
    }
}
