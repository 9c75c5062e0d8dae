//! HTTP gateway hosting every tool server under its own path prefix.
//!
//! Each tool server is exposed at `<prefix>/mcp` over the Streamable HTTP
//! transport, e.g. `/calculator/mcp`. The mounts are started and stopped
//! together through a [`SessionStack`].

pub mod lifecycle;


pub use lifecycle::{ExitFailure, ScopeFuture, SessionError, SessionScope, SessionStack};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;
use crate::server::ToolServer;

/// One tool server mounted under a path prefix.
///
/// The mount owns the cancellation token handed to rmcp's transport; exiting
/// the scope cancels it, which ends every stream still open on this tool.
pub struct ToolMount {
    prefix: String,
    server: ToolServer,
    cancel: CancellationToken,
    session_manager: Arc<LocalSessionManager>,
    running: AtomicBool,
}

impl ToolMount {
    pub fn new(prefix: impl Into<String>, server: ToolServer, parent: &CancellationToken) -> Self {
        Self {
            prefix: prefix.into(),
            server,
            cancel: parent.child_token(),
            session_manager: Arc::new(LocalSessionManager::default()),
            running: AtomicBool::new(false),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path the MCP endpoint is served at.
    pub fn endpoint(&self) -> String {
        format!("{}/mcp", self.prefix)
    }

    pub fn server(&self) -> &ToolServer {
        &self.server
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Build the Streamable HTTP service for this mount.
    pub fn http_service(&self) -> StreamableHttpService<ToolServer, LocalSessionManager> {
        let server = self.server.clone();
        let config = StreamableHttpServerConfig {
            stateful_mode: false,
            cancellation_token: self.cancel.clone(),
            ..Default::default()
        };

        StreamableHttpService::new(
            move || Ok(server.clone()),
            self.session_manager.clone(),
            config,
        )
    }

    fn stop(&self) {
        self.cancel.cancel();
        self.running.store(false, Ordering::SeqCst);
    }
}

impl SessionScope for ToolMount {
    fn name(&self) -> &str {
        self.server.name()
    }

    fn enter(&self) -> ScopeFuture<'_> {
        Box::pin(async move {
            if self.cancel.is_cancelled() {
                bail!("{} was cancelled before it started", self.server.name());
            }
            if self.server.tool_registry().is_empty() {
                bail!("{} has no tools registered", self.server.name());
            }
            self.running.store(true, Ordering::SeqCst);
            info!(
                server = self.server.name(),
                endpoint = %self.endpoint(),
                tools = self.server.tool_registry().len(),
                "Tool server mounted"
            );
            Ok(())
        })
    }

    fn exit(&self) -> ScopeFuture<'_> {
        Box::pin(async move {
            self.stop();
            Ok(())
        })
    }

    fn abort(&self) {
        self.stop();
    }
}

/// All tool mounts plus the token that shuts them down.
pub struct Gateway {
    mounts: Vec<Arc<ToolMount>>,
    shutdown: CancellationToken,
}

impl Gateway {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            mounts: Vec::new(),
            shutdown,
        }
    }

    /// Mount `server` under `prefix`.
    pub fn mount(mut self, prefix: impl Into<String>, server: ToolServer) -> Self {
        let mount = ToolMount::new(prefix, server, &self.shutdown);
        self.mounts.push(Arc::new(mount));
        self
    }

    pub fn mounts(&self) -> &[Arc<ToolMount>] {
        &self.mounts
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Enter every mount's scope in mount order.
    pub async fn start(&self) -> Result<SessionStack, SessionError> {
        SessionStack::enter_all(
            self.mounts
                .iter()
                .map(|m| m.clone() as Arc<dyn SessionScope>)
                .collect::<Vec<_>>(),
        )
        .await
    }

    /// Router with every mounted endpoint and the health check.
    pub fn router(&self) -> Router {
        let mut router = Router::new().merge(api::create_health_router(self.mounts.clone()));
        for mount in &self.mounts {
            let endpoint = Router::new()
                .fallback_service(mount.http_service())
                .layer(middleware::from_fn_with_state(mount.clone(), require_running));
            router = router.nest_service(&mount.endpoint(), endpoint);
        }

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
    }

    /// Bind `addr`, start the mounts and serve until the shutdown token fires.
    ///
    /// The mounts are torn down after the server stops, whether it stopped
    /// cleanly or with an error.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let stack = self.start().await?;
        info!(mounts = stack.len(), "Tool servers started");
        let router = self.router();

        for mount in &self.mounts {
            info!("{} available at http://{}{}", mount.server().name(), addr, mount.endpoint());
        }
        info!("Gateway listening on http://{}", addr);

        let shutdown = self.shutdown.clone();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;

        info!("Gateway stopping");
        self.shutdown.cancel();
        let closed = stack.close().await;

        served?;
        closed?;
        Ok(())
    }
}

/// Refuse requests for a mount whose scope is not entered.
async fn require_running(
    State(mount): State<Arc<ToolMount>>,
    request: Request,
    next: Next,
) -> Response {
    if !mount.is_running() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("{} is not running", mount.server().name()),
        )
            .into_response();
    }
    next.run(request).await
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
