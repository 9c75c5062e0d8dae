// Core modules
mod config;
mod error;
pub mod api;
pub mod gateway;
pub mod search;
pub mod server;
pub mod tools;

// Re-export key types and functions
pub use config::{GatewayConfig, ToolKind, log_filter};
pub use error::{SoftErrorCode, ToolError, ToolResult};
pub use gateway::{Gateway, SessionStack, ToolMount};
pub use server::ToolServer;
pub use tools::{ToolHandler, ToolRegistry};

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use search::{
    DocsSearchProvider, HtmlPageConverter, PageConverter, SerperClient, TavilyClient,
    WebSearchProvider,
};
use tools::{DocsSearchHandler, EchoHandler, WebSearchHandler, calculator};

/// External clients injected into the search tools.
#[derive(Clone)]
pub struct Providers {
    pub web_search: Arc<dyn WebSearchProvider>,
    pub docs_search: Arc<dyn DocsSearchProvider>,
    pub pages: Arc<dyn PageConverter>,
}

impl Providers {
    /// Build the real HTTP clients from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let tavily_key = config.tavily_api_key.clone().unwrap_or_default();
        Ok(Self {
            web_search: Arc::new(TavilyClient::new(tavily_key)?),
            docs_search: Arc::new(SerperClient::new(
                config.serper_api_key.clone(),
                config.search_language.clone(),
            )?),
            pages: Arc::new(HtmlPageConverter::new(config.page_timeout)?),
        })
    }
}

/// Build the tool server for `kind` with its dependencies wired in.
pub fn create_tool_server(
    kind: ToolKind,
    config: &GatewayConfig,
    providers: &Providers,
) -> ToolServer {
    let registry = match kind {
        ToolKind::Echo => ToolRegistry::new().register_handler(EchoHandler::new()),
        ToolKind::Calculator => calculator::registry(),
        ToolKind::WebSearch => ToolRegistry::new()
            .register_handler(WebSearchHandler::new(providers.web_search.clone())),
        ToolKind::DocsSearch => ToolRegistry::new().register_handler(
            DocsSearchHandler::new(providers.docs_search.clone(), providers.pages.clone())
                .with_fetch_concurrency(config.fetch_concurrency),
        ),
    };

    ToolServer::new(kind.server_name(), Arc::new(registry)).with_instructions(kind.instructions())
}

/// Convenience function to create the gateway with every tool mounted.
///
/// Validates the configuration first, so a missing Tavily key fails here
/// rather than on the first search.
pub fn create_gateway(
    config: &GatewayConfig,
    providers: &Providers,
    shutdown: CancellationToken,
) -> Result<Gateway> {
    config.validate(&ToolKind::ALL)?;

    let gateway = ToolKind::ALL
        .iter()
        .fold(Gateway::new(shutdown), |gateway, kind| {
            gateway.mount(kind.mount_path(), create_tool_server(*kind, config, providers))
        });
    Ok(gateway)
}
