//! Serper (Google search) client used for site-scoped documentation lookups.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use super::{DocsSearchProvider, ProviderFuture, USER_AGENT};

pub const SERPER_URL: &str = "https://google.serper.dev/search";

/// Organic results requested per search.
const RESULTS_PER_SEARCH: usize = 2;

pub struct SerperClient {
    api_key: Option<String>,
    endpoint: String,
    language: String,
    client: Client,
}

impl SerperClient {
    pub fn new(api_key: Option<String>, language: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, language, SERPER_URL)
    }

    pub fn with_endpoint(
        api_key: Option<String>,
        language: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            endpoint: endpoint.into(),
            language: language.into(),
            client,
        })
    }

    async fn post_search(&self, query: &str) -> Result<Value> {
        debug!(query, "Sending Serper search");

        let mut request = self.client.post(&self.endpoint).json(&json!({
            "q": query,
            "hl": self.language,
            "num": RESULTS_PER_SEARCH,
        }));
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = request.send().await.context("Request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!(
                "Error: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            );
        }

        Ok(response.json::<Value>().await?)
    }
}

impl DocsSearchProvider for SerperClient {
    fn search(&self, query: &str) -> ProviderFuture<'_, Value> {
        let query = query.to_string();
        Box::pin(async move { self.post_search(&query).await })
    }
}
