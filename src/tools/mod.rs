//! Tool handlers and the registry that dispatches to them.
//!
//! Each tool server (echo, calculator, web search, docs search) gets its own
//! `ToolRegistry`, built in [`crate::create_tool_server`] with its dependencies
//! injected.

mod registry;

pub use registry::{ToolContext, ToolFuture, ToolHandler, ToolRegistry};

pub mod calculator;
pub mod docs_search;
pub mod echo;
pub mod web_search;

pub use docs_search::{DocRecord, DocsOutcome, DocsSearchHandler};
pub use echo::EchoHandler;
pub use web_search::{SearchResult, WebSearchHandler, WebSearchOutput};
