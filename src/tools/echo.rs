//! Handler for the `echo` tool.

use rmcp::model::JsonObject;
use serde::Deserialize;
use serde_json::json;

use crate::tools::registry::{object_schema, parse_args, structured_result};
use crate::tools::{ToolContext, ToolFuture, ToolHandler};

/// Marker prepended to every echoed text.
pub const ECHO_PREFIX: &str = "Echo: ";

#[derive(Debug, Deserialize)]
struct EchoArgs {
    texto: String,
}

/// Echoes the caller's text back with [`ECHO_PREFIX`].
#[derive(Debug, Default)]
pub struct EchoHandler;

impl EchoHandler {
    pub fn new() -> Self {
        Self
    }
}

pub fn echo(texto: &str) -> String {
    format!("{ECHO_PREFIX}{texto}")
}

impl ToolHandler for EchoHandler {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes the user's input."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(&[(
            "texto",
            json!({ "type": "string", "description": "The text to echo." }),
        )])
    }

    fn execute(&self, args: JsonObject, _ctx: &ToolContext) -> ToolFuture<'_> {
        Box::pin(async move {
            let args: EchoArgs = parse_args(args)?;
            Ok(structured_result(json!(echo(&args.texto))))
        })
    }
}
