//! Page fetching and HTML-to-text conversion.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{PageConverter, ProviderFuture, USER_AGENT};

/// Line width used when rendering HTML as text.
pub const DEFAULT_TEXT_WIDTH: usize = 100;

pub struct HtmlPageConverter {
    client: Client,
    width: usize,
}

impl HtmlPageConverter {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            width: DEFAULT_TEXT_WIDTH,
        })
    }

    async fn fetch_and_convert(&self, url: &str) -> Result<String> {
        let url = parse_page_url(url)?;
        let html = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(url = %url, bytes = html.len(), "Fetched page");

        // Rendering is CPU bound; keep it off the async workers.
        let width = self.width;
        tokio::task::spawn_blocking(move || html_to_text(&html, width))
            .await
            .context("Conversion task panicked")?
    }
}

impl PageConverter for HtmlPageConverter {
    fn convert(&self, url: &str) -> ProviderFuture<'_, String> {
        let url = url.to_string();
        Box::pin(async move { self.fetch_and_convert(&url).await })
    }
}

/// Only absolute http(s) links are fetched.
pub fn parse_page_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid page URL: {}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("Unsupported URL scheme '{}' for {}", other, raw),
    }
}

/// Render an HTML document as wrapped plain text.
pub fn html_to_text(html: &str, width: usize) -> Result<String> {
    let text = html2text::from_read(html.as_bytes(), width)?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_keeps_content() {
        let html = "<html><head><title>T</title></head><body>\
                    <h1>Chains</h1><p>Use a chain to compose calls.</p></body></html>";
        let text = html_to_text(html, DEFAULT_TEXT_WIDTH).unwrap();
        assert!(text.contains("Chains"));
        assert!(text.contains("Use a chain to compose calls."));
        assert!(!text.contains("<p>"));
    }

    #[tokio::test]
    async fn test_convert_fetches_and_renders_page() {
        use crate::search::mock_server::MockServer;
        use axum::http::StatusCode;

        let server = MockServer::spawn(StatusCode::OK, serde_json::json!({})).await;
        let converter = HtmlPageConverter::new(Duration::from_secs(5)).unwrap();

        let text = converter.convert(&server.url("/page")).await.unwrap();
        assert!(text.contains("Chains"));
        assert!(text.contains("Compose calls with a chain."));
        assert!(!text.contains("<h1>"));

        assert!(converter.convert(&server.url("/missing")).await.is_err());
    }

    #[test]
    fn test_parse_page_url() {
        assert!(parse_page_url("https://python.langchain.com/docs/intro").is_ok());
        assert!(parse_page_url("ftp://example.com/file").is_err());
        assert!(parse_page_url("/docs/relative").is_err());
    }

    #[test]
    fn test_html_to_text_empty_body() {
        let text = html_to_text("<html><body></body></html>", DEFAULT_TEXT_WIDTH).unwrap();
        assert!(text.is_empty());
    }
}
