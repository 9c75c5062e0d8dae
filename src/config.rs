use std::time::Duration;

use anyhow::bail;
use clap::ValueEnum;
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_SEARCH_LANGUAGE: &str = "pt-br";

/// Log filter: `rust_log` (normally `RUST_LOG`) plus the crate's defaults.
pub fn log_filter(rust_log: Option<&str>) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::new(rust_log.unwrap_or_default())
        .add_directive("mcp_tool_gateway=info".parse()?)
        .add_directive("rmcp=warn".parse()?))
}

/// The tool servers this binary knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolKind {
    Echo,
    Calculator,
    WebSearch,
    DocsSearch,
}

impl ToolKind {
    /// Every tool, in mount order.
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Echo,
        ToolKind::Calculator,
        ToolKind::WebSearch,
        ToolKind::DocsSearch,
    ];

    /// Path prefix the gateway mounts this tool under.
    pub fn mount_path(&self) -> &'static str {
        match self {
            ToolKind::Echo => "/echo",
            ToolKind::Calculator => "/calculator",
            ToolKind::WebSearch => "/basic_web_search",
            ToolKind::DocsSearch => "/search_docs",
        }
    }

    /// Server name reported in the MCP `initialize` response.
    pub fn server_name(&self) -> &'static str {
        match self {
            ToolKind::Echo => "EchoServer",
            ToolKind::Calculator => "MathServer",
            ToolKind::WebSearch => "basic_web_search",
            ToolKind::DocsSearch => "documents_from_web",
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            ToolKind::Echo => "Echoes text back with an \"Echo: \" prefix.",
            ToolKind::Calculator => {
                "Arithmetic, trigonometry, constants and a restricted expression evaluator."
            }
            ToolKind::WebSearch => "Searches the web through the Tavily API.",
            ToolKind::DocsSearch => {
                "Searches the langchain, llama_index, mcp and openai documentation sites."
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub tavily_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    /// `hl` parameter sent with documentation searches.
    pub search_language: String,
    /// Pages fetched concurrently per docs search; 1 keeps it sequential.
    pub fetch_concurrency: usize,
    pub page_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tavily_api_key: None,
            serper_api_key: None,
            search_language: DEFAULT_SEARCH_LANGUAGE.to_string(),
            fetch_concurrency: 1,
            page_timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check that everything `tools` needs is configured.
    pub fn validate(&self, tools: &[ToolKind]) -> anyhow::Result<()> {
        if tools.contains(&ToolKind::WebSearch) && !has_value(&self.tavily_api_key) {
            bail!("Missing TAVILY_API_KEY environment variable");
        }

        if tools.contains(&ToolKind::DocsSearch) && !has_value(&self.serper_api_key) {
            warn!("SERPER_API_KEY is not set; documentation searches will return no results");
        }

        if self.fetch_concurrency == 0 {
            bail!("Docs fetch concurrency must be at least 1");
        }

        Ok(())
    }
}

fn has_value(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}
