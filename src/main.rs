//! pg-gateway-mcp entry point.
//!
//! Serves PostgreSQL introspection and query tools over MCP, for one or more
//! named databases.

use clap::Parser;
use pg_gateway_mcp::config::{Config, TransportMode};
use pg_gateway_mcp::db::PoolRegistry;
use pg_gateway_mcp::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn serve(transport: impl Transport, registry: &PoolRegistry) -> i32 {
    info!(transport = transport.name(), "Using transport");
    match transport.run().await {
        Ok(()) => {
            info!("Server shutdown complete");
            0
        }
        Err(e) => {
            error!(error = %e, "Server error");
            registry.close_all().await;
            1
        }
    }
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let config = Config::parse();
    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting pg-gateway-mcp v{}",
        env!("CARGO_PKG_VERSION")
    );

    let databases = match config.static_databases() {
        Ok(databases) => databases,
        Err(e) => {
            error!(error = %e, "Invalid database configuration");
            std::process::exit(1);
        }
    };

    let registry = PoolRegistry::bootstrap(databases, config.database_url.as_deref()).await;
    if registry.is_empty() {
        error!(
            failed = registry.failures().len(),
            "No database could be registered; configure --database, --config or DATABASE_URL"
        );
        std::process::exit(1);
    }
    info!(
        databases = ?registry.names(),
        default = registry.implicit_name().unwrap_or("(none)"),
        failed = registry.failures().len(),
        "Database registry ready"
    );

    let registry = Arc::new(registry);
    let code = match config.transport {
        TransportMode::Stdio => serve(StdioTransport::new(registry.clone()), &registry).await,
        TransportMode::Http => {
            let transport =
                HttpTransport::new(registry.clone(), config.http_bind_addr(), &config.mcp_endpoint);
            serve(transport, &registry).await
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
}
