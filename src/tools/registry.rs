//! Tool registry for managing MCP tool handlers.
//!
//! Provides a `ToolHandler` trait for implementing tools and a `ToolRegistry`
//! for registering and invoking them. Every tool server owns one registry.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool as McpTool};
use serde_json::Value;

use crate::error::{ToolError, ToolResult};

/// Boxed future returned by [`ToolHandler::execute`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = ToolResult<CallToolResult>> + Send + 'a>>;

/// Context passed to tool handlers during execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Name of the tool server handling the call.
    pub server: String,
    /// User agent of the HTTP caller, when the call arrived over HTTP.
    pub client: Option<String>,
}

/// Trait for handling MCP tool invocations.
///
/// Each tool implements this trait to define its schema and execution logic.
pub trait ToolHandler: Send + Sync {
    /// Returns the tool's wire name (e.g., "soma").
    fn name(&self) -> &str;

    /// Returns the tool's description.
    fn description(&self) -> &str;

    /// Returns the input schema for this tool.
    fn input_schema(&self) -> JsonObject;

    /// Returns the output schema for this tool (optional).
    fn output_schema(&self) -> Option<JsonObject> {
        None
    }

    /// Executes the tool with the given arguments.
    fn execute(&self, args: JsonObject, ctx: &ToolContext) -> ToolFuture<'_>;

    /// Converts this handler to an `McpTool` for use in `list_tools`.
    fn to_mcp_tool(&self) -> McpTool {
        use std::borrow::Cow;

        McpTool {
            name: Cow::Owned(self.name().to_string()),
            title: None,
            description: Some(Cow::Owned(self.description().to_string())),
            input_schema: Arc::new(self.input_schema()),
            output_schema: self.output_schema().map(Arc::new),
            annotations: None,
            icons: None,
            meta: None,
        }
    }
}

/// Registry for managing tool handlers.
///
/// Handlers are kept in name order so `tools/list` output is stable.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool handler from a type that implements `ToolHandler`.
    pub fn register_handler<T: ToolHandler + 'static>(mut self, handler: T) -> Self {
        self.handlers.insert(handler.name().to_string(), Arc::new(handler));
        self
    }

    /// Get a tool handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// List all registered tool names.
    pub fn list_names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Get all registered tools as `McpTool` instances for `list_tools`.
    pub fn list_tools(&self) -> Vec<McpTool> {
        self.handlers
            .values()
            .map(|handler| handler.to_mcp_tool())
            .collect()
    }

    /// Execute a tool by name with the given arguments.
    pub async fn call_tool(
        &self,
        name: &str,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> ToolResult<CallToolResult> {
        let handler = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        handler.execute(args, ctx).await
    }

    /// Return the number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Return `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Build an object schema from `(name, schema)` pairs, all of them required.
pub(crate) fn object_schema(properties: &[(&str, Value)]) -> JsonObject {
    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), Value::from("object"));

    let mut props = serde_json::Map::new();
    for (name, prop) in properties {
        props.insert(name.to_string(), prop.clone());
    }
    let required: Vec<Value> = properties
        .iter()
        .map(|(name, _)| Value::from(*name))
        .collect();

    schema.insert("properties".to_string(), Value::Object(props));
    schema.insert("required".to_string(), Value::Array(required));
    schema
}

/// Deserialize tool arguments into a typed struct.
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(args: JsonObject) -> ToolResult<T> {
    Ok(serde_json::from_value(Value::Object(args))?)
}

/// Wrap a JSON value as a successful tool result.
///
/// The value is returned both as text content and as structured content
/// under a `result` key, so clients that only read text still see it.
pub(crate) fn structured_result(value: Value) -> CallToolResult {
    let text = match &value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: Some(serde_json::json!({ "result": value })),
        is_error: Some(false),
        meta: None,
    }
}
