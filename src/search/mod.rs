//! External providers used by the search tools.
//!
//! Each provider sits behind a trait so the tool handlers receive an
//! explicitly constructed client and tests can substitute fakes.

#[cfg(test)]
pub(crate) mod mock_server;
mod page;
mod serper;
mod tavily;

pub use page::{DEFAULT_TEXT_WIDTH, HtmlPageConverter, html_to_text, parse_page_url};
pub use serper::{SERPER_URL, SerperClient};
pub use tavily::{TAVILY_URL, TavilyClient};

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde_json::Value;

/// Boxed future returned by provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("mcp-tool-gateway/", env!("CARGO_PKG_VERSION"));

/// General web search (Tavily-shaped responses: `{"results": [...]}`).
pub trait WebSearchProvider: Send + Sync {
    fn search(&self, query: &str, max_results: usize) -> ProviderFuture<'_, Value>;
}

/// Site-scoped search used by the docs tool (Serper-shaped responses:
/// `{"organic": [{"link", "title", ...}]}`).
pub trait DocsSearchProvider: Send + Sync {
    fn search(&self, query: &str) -> ProviderFuture<'_, Value>;
}

/// Fetches a page and renders it as plain text.
pub trait PageConverter: Send + Sync {
    fn convert(&self, url: &str) -> ProviderFuture<'_, String>;
}
