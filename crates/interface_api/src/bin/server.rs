//! Open Hospital Core - API Server Binary
//!
//! This binary starts the HTTP API server for the hospital billing core.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin hospital-api
//!
//! # Run with environment variables
//! API_PORT=9090 API_TIMEZONE=Africa/Nairobi API_CURRENCY=KES cargo run --bin hospital-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_CURRENCY` - Currency for invoices that name none (default: USD)
//! * `API_TIMEZONE` - Zone in which due dates are compared (default: UTC)
//! * `API_SUPPRESSION_WINDOW_SECS` - Seconds a write protects the stored status (default: 600)
//! * `API_SUPPRESSION_CLOCK` - `manual_edits_only` or `any_write` (default: manual_edits_only)
//! * `API_PAYMENT_TERMS_DAYS` - Default days until an invoice is due (default: 30)
//! * `API_INVOICE_NUMBER_PAD` - Digits in an invoice number (default: 6)
//! * `API_NUMBERING_ATTEMPTS` - Attempts to allocate a unique number (default: 3)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_billing::adapters::InMemoryInvoiceStore;
use core_kernel::SystemClock;
use interface_api::{config::ApiConfig, create_router, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, wires the invoice store and
/// starts the HTTP server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment or is invalid
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("Failed to load API configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Open Hospital Core API Server"
    );

    // Records live in memory for the lifetime of the process
    let store = InMemoryInvoiceStore::new();
    let state = AppState::from_config(
        config.clone(),
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(SystemClock),
    )
    .context("Invalid API configuration")?;

    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// # Arguments
///
/// * `log_level` - The minimum log level to output (trace, debug, info, warn, error)
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
