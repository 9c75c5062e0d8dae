use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use mcp_tool_gateway::{
    GatewayConfig, Providers, ToolKind, create_gateway, create_tool_server, gateway, log_filter,
};

// rmcp imports for MCP stdio server mode
use rmcp::service::ServiceExt;
use rmcp::transport::stdio;

#[derive(Parser)]
#[command(name = "mcp-tool-gateway")]
#[command(about = "MCP gateway for echo, calculator, web search and docs search tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve every tool over Streamable HTTP, each under its own path
    Serve {
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, env = "PORT", default_value_t = 10000)]
        port: u16,
        #[command(flatten)]
        tools: ToolArgs,
    },
    /// Run a single tool server over stdio (for use in mcp.json)
    Stdio {
        #[arg(long, value_enum)]
        tool: ToolKind,
        #[command(flatten)]
        tools: ToolArgs,
    },
}

#[derive(Args)]
struct ToolArgs {
    /// Tavily API key, required by web_search
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    tavily_api_key: Option<String>,
    /// Serper API key used by get_docs_from_web
    #[arg(long, env = "SERPER_API_KEY", hide_env_values = true)]
    serper_api_key: Option<String>,
    /// Language hint sent with documentation searches
    #[arg(long, env = "SEARCH_LANGUAGE", default_value = "pt-br")]
    search_language: String,
    /// Documentation pages fetched concurrently per search
    #[arg(long, env = "DOCS_FETCH_CONCURRENCY", default_value_t = 1)]
    fetch_concurrency: usize,
    /// Timeout in seconds for each documentation page fetch
    #[arg(long, env = "PAGE_TIMEOUT_SECS", default_value_t = 30)]
    page_timeout_secs: u64,
}

impl ToolArgs {
    fn into_config(self, host: String, port: u16) -> GatewayConfig {
        GatewayConfig {
            host,
            port,
            tavily_api_key: self.tavily_api_key,
            serper_api_key: self.serper_api_key,
            search_language: self.search_language,
            fetch_concurrency: self.fetch_concurrency,
            page_timeout: Duration::from_secs(self.page_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never mix with stdio MCP traffic.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref())?)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port, tools } => {
            let config = tools.into_config(host, port);
            let providers = Providers::from_config(&config)?;

            let shutdown = CancellationToken::new();
            let gateway = create_gateway(&config, &providers, shutdown.clone())?;

            tokio::spawn(async move {
                gateway::shutdown_signal().await;
                info!("Shutdown signal received");
                shutdown.cancel();
            });

            gateway.serve(&config.bind_addr()).await?;
            info!("Gateway stopped");
        }
        Commands::Stdio { tool, tools } => {
            let defaults = GatewayConfig::default();
            let config = tools.into_config(defaults.host, defaults.port);
            config.validate(&[tool])?;
            let providers = Providers::from_config(&config)?;

            info!("Starting {} over stdio", tool.server_name());
            let service = create_tool_server(tool, &config, &providers)
                .serve(stdio())
                .await
                .inspect_err(|e| tracing::error!("serving error: {:?}", e))?;

            // Block until the MCP session ends.
            service.waiting().await?;
            info!("MCP stdio server session ended");
        }
    }

    Ok(())
}
