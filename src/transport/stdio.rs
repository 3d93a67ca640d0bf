//! Stdio transport: JSON-RPC on stdin/stdout, logs on stderr.

use crate::db::PoolRegistry;
use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::transport::{Transport, shutdown_signal};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::{info, warn};

pub struct StdioTransport {
    registry: Arc<PoolRegistry>,
}

impl StdioTransport {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        Self { registry }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!(databases = self.registry.len(), "Starting MCP server with stdio transport");

        let running = DbService::new(self.registry.clone())
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let interrupted = tokio::select! {
            result = running.waiting() => {
                if let Err(e) = result {
                    warn!(error = %e, "Stdio transport error");
                    self.registry.close_all().await;
                    return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                }
                info!("Client closed the session");
                false
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if interrupted {
            tokio::spawn(async {
                shutdown_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        self.registry.close_all().await;

        if interrupted {
            // The stdin reader blocks and cannot be cancelled, so leave directly.
            std::process::exit(0);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_transport_name() {
        let transport = StdioTransport::new(Arc::new(PoolRegistry::new()));
        assert_eq!(transport.name(), "stdio");
    }
}
