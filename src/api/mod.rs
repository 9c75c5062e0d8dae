// Plain HTTP endpoints served next to the MCP mounts

use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde_json::Value;

use crate::gateway::ToolMount;

pub type HealthState = Arc<Vec<Arc<ToolMount>>>;

pub fn create_health_router(mounts: Vec<Arc<ToolMount>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(Arc::new(mounts))
}

/// Reports each mounted tool server and whether its scope is running.
///
/// Answers 503 once any mount has stopped, so load balancers drain the
/// process during shutdown.
async fn health_check(State(mounts): State<HealthState>) -> (StatusCode, Json<Value>) {
    let tools: Vec<Value> = mounts
        .iter()
        .map(|m| {
            serde_json::json!({
                "name": m.server().name(),
                "endpoint": m.endpoint(),
                "running": m.is_running(),
                "tools": m.server().tool_registry().list_names(),
            })
        })
        .collect();

    let all_running = mounts.iter().all(|m| m.is_running());
    let (status, label) = if all_running {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "stopping")
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "tools": tools,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
