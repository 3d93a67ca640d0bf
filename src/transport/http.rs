//! Streamable HTTP transport.
//!
//! Every HTTP session gets its own `DbService`, all sharing one registry.

use crate::db::PoolRegistry;
use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::transport::{Transport, shutdown_signal};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// How long open streams may keep the server alive after a shutdown signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    registry: Arc<PoolRegistry>,
    bind_addr: String,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(
        registry: Arc<PoolRegistry>,
        bind_addr: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            bind_addr: bind_addr.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn router(&self) -> axum::Router {
        let registry = self.registry.clone();
        let service = StreamableHttpService::new(
            move || Ok(DbService::new(registry.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service rejects "/"
        if self.endpoint == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.endpoint, service)
        }
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        let listener = TcpListener::bind(&self.bind_addr).await.map_err(|e| {
            DbError::connection(
                format!("Failed to bind to {}: {}", self.bind_addr, e),
                "Check that the port is available",
            )
        })?;
        info!(
            addr = %self.bind_addr,
            endpoint = %self.endpoint,
            databases = self.registry.len(),
            "Starting MCP server with HTTP transport"
        );

        let draining = Arc::new(Notify::new());
        let notify = draining.clone();
        let server = axum::serve(listener, self.router()).with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        });

        let outcome = tokio::select! {
            result = server => result.map_err(|e| {
                error!(error = %e, "HTTP server error");
                DbError::internal(format!("HTTP server error: {}", e))
            }),
            _ = async {
                draining.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)"
                );
                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, dropping open connections");
                    }
                    _ = shutdown_signal() => {
                        warn!("Received second signal, dropping open connections");
                    }
                }
            } => Ok(()),
        };

        info!("HTTP server stopped");
        self.registry.close_all().await;
        outcome
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
