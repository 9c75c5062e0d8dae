//! Error types for the tool-invocation boundary.
//!
//! Two policies coexist here. Local failures (bad arguments, calculator
//! domain errors, unknown libraries) are [`ToolError`]s and travel back to
//! the caller as MCP errors. Failures of external providers never become a
//! `ToolError`; the tools fold them into the returned data and tag that data
//! with a [`SoftErrorCode`] so monitoring can still tell them apart.

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Errors surfaced through the tool-invocation channel.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    /// The caller supplied arguments the tool cannot work with.
    #[error("{0}")]
    InvalidArgument(String),

    /// No tool with this name is registered on the server.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Something went wrong inside the server itself.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for tool handlers.
pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Convert this error to an MCP `ErrorData` for protocol responses.
    pub fn to_mcp_error(&self) -> McpError {
        match self {
            // -32602: Invalid params
            Self::InvalidArgument(msg) => McpError::invalid_params(msg.clone(), None),
            Self::NotFound(_) => McpError::invalid_params(self.to_string(), None),
            // -32603: Internal error
            Self::Internal(msg) => McpError::internal_error(msg.clone(), None),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArgument(format!("Invalid arguments: {}", err))
    }
}

/// Machine-readable tag attached to soft results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftErrorCode {
    /// The search provider call failed outright.
    SearchFailed,
    /// The provider answered, but without the expected result field.
    MissingResults,
    /// The provider returned zero usable hits.
    NoResults,
    /// Every hit failed to fetch or convert.
    NoContent,
}

impl SoftErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchFailed => "search_failed",
            Self::MissingResults => "missing_results",
            Self::NoResults => "no_results",
            Self::NoContent => "no_content",
        }
    }
}

impl std::fmt::Display for SoftErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
