//! Bills API Server Binary
//!
//! This binary starts the HTTP API server for the bills system.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin bills-api
//!
//! # Run with environment variables
//! BILLS_PORT=8080 BILLS_DATABASE_URL=postgres://... cargo run --bin bills-api
//! ```
//!
//! # Environment Variables
//!
//! * `BILLS_HOST` - Server host (default: 0.0.0.0)
//! * `BILLS_PORT` - Server port (default: 8080)
//! * `BILLS_DATABASE_URL` - PostgreSQL connection string (falls back to `DATABASE_URL`)
//! * `BILLS_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `BILLS_BASE_CURRENCY` - Currency bill totals are normalized into (default: EUR)
//! * `BILLS_ROW_POLICY` - `reject` or `skip` for malformed line-item rows (default: reject)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_billing::{BillingService, ExchangeRateService};
use infra_db::{
    create_pool, run_migrations, DatabaseConfig, ExchangeRateRepository, PostgresBillAdapter,
    PostgresDirectoryAdapter,
};
use interface_api::{config::ApiConfig, create_router, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, connects and migrates the
/// database, and starts the HTTP server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        base_currency = %config.base_currency,
        row_policy = ?config.row_policy,
        "Starting bills API server"
    );

    let registry = config.registry().context("invalid BILLS_BASE_CURRENCY")?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(DatabaseConfig::new(config.database_url.clone()))
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool).await.context("failed to run migrations")?;
    tracing::info!("Database ready");

    let rate_store = Arc::new(ExchangeRateRepository::new(pool.clone()));
    let billing = BillingService::new(
        Arc::new(PostgresBillAdapter::new(pool.clone(), registry)),
        rate_store.clone(),
    )
    .with_registry(registry)
    .with_row_policy(config.row_policy);
    let rates = ExchangeRateService::new(rate_store);
    let directory = Arc::new(PostgresDirectoryAdapter::new(pool));

    let app = create_router(AppState::new(billing, rates, directory));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("invalid server address")?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads configuration, honouring a plain `DATABASE_URL` when the prefixed one is unset
fn load_config() -> anyhow::Result<ApiConfig> {
    let mut config = ApiConfig::from_env().context("invalid BILLS_* configuration")?;
    if std::env::var("BILLS_DATABASE_URL").is_err() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
    }
    Ok(config)
}

/// Initializes the tracing subscriber for structured logging.
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
