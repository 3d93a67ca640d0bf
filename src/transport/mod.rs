//! Transports carrying the MCP session: stdio (default) and streamable HTTP.

pub mod http;
pub mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

use crate::error::DbResult;
use std::future::Future;
use tokio::signal;
use tracing::{info, warn};

pub trait Transport: Send + Sync {
    /// Serve until the client goes away or a shutdown signal arrives.
    /// Pools are closed before this returns.
    fn run(&self) -> impl Future<Output = DbResult<()>> + Send;

    fn name(&self) -> &'static str;
}

/// Resolve on SIGINT or SIGTERM.
///
/// A signal whose handler cannot be installed never fires; the other one
/// still does.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
