//! MCP server implementation using rmcp.
//!
//! A [`ToolServer`] answers `tools/list` and `tools/call` for one tool
//! registry. The gateway runs one of these per mounted path.

use std::future::Future;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};
use tracing::{info, warn};

use crate::tools::{ToolContext, ToolRegistry};

/// Type alias for HTTP request parts stored in rmcp extensions.
type HttpParts = http::request::Parts;

/// MCP server that handles protocol requests and delegates to tool handlers.
#[derive(Clone)]
pub struct ToolServer {
    name: String,
    instructions: Option<String>,
    tool_registry: Arc<ToolRegistry>,
}

impl ToolServer {
    /// Create a new server exposing the tools in `tool_registry`.
    pub fn new(name: impl Into<String>, tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            name: name.into(),
            instructions: None,
            tool_registry,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the tool registry.
    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }
}

/// User agent of the HTTP caller, if the call came in over HTTP.
fn user_agent(parts: Option<&HttpParts>) -> Option<String> {
    parts
        .and_then(|parts| parts.headers.get(http::header::USER_AGENT))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

impl ServerHandler for ToolServer {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let result = ListToolsResult {
            tools: self.tool_registry.list_tools(),
            next_cursor: None,
            ..Default::default()
        };
        std::future::ready(Ok(result))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_name = request.name.to_string();
        let args = request.arguments.unwrap_or_default();
        let registry = self.tool_registry.clone();

        // rmcp stores http::request::Parts in extensions for HTTP transport
        let client = user_agent(context.extensions.get::<HttpParts>());

        let ctx = ToolContext {
            server: self.name.clone(),
            client,
        };

        async move {
            let client = ctx.client.as_deref().unwrap_or("stdio");
            info!(server = %ctx.server, tool = %tool_name, client, "Tool call");

            match registry.call_tool(&tool_name, args, &ctx).await {
                Ok(result) => Ok(result),
                Err(e) => {
                    warn!(
                        server = %ctx.server,
                        tool = %tool_name,
                        client,
                        "Tool call rejected: {}",
                        e
                    );
                    Err(e.to_mcp_error())
                }
            }
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: self.instructions.clone(),
        }
    }
}
