//! Local HTTP server standing in for the search APIs and documentation pages.

#![cfg(test)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::{get, post},
};
use serde_json::Value;

pub const PAGE_HTML: &str = "<html><head><title>Chains</title></head><body>\
    <h1>Chains</h1><p>Compose calls with a chain.</p></body></html>";

/// One request received on `/search`.
#[derive(Debug, Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: Value,
}

struct MockState {
    status: StatusCode,
    response: Value,
    captured: Mutex<Vec<Captured>>,
}

pub struct MockServer {
    base: String,
    state: Arc<MockState>,
}

impl MockServer {
    /// Serve `response` with `status` on `POST /search`, an HTML page on
    /// `GET /page` and a 404 on `GET /missing`.
    pub async fn spawn(status: StatusCode, response: Value) -> Self {
        let state = Arc::new(MockState {
            status,
            response,
            captured: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/search", post(search))
            .route("/page", get(|| async { Html(PAGE_HTML) }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: format!("http://{}", addr),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.state.captured.lock().unwrap().clone()
    }
}

async fn search(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.captured.lock().unwrap().push(Captured { headers, body });
    (state.status, Json(state.response.clone()))
}
