//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod accounts;
mod config;

use std::sync::Arc;

use anyhow::Context;
use auth::middleware::require_auth;
use auth::router::auth_middleware_state;
use auth::{PgUserRepository, SessionCache, auth_router};
use axum::Router;
use axum::middleware::from_fn_with_state;
use clap::Parser;
use loyalty::{AccrualPoller, HttpAccrualClient, PgLedgerRepository, loyalty_router};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::accounts::LedgerAccounts;
use crate::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,loyalty=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let loyalty_config = cli.loyalty_config();
    let auth_config = Arc::new(cli.auth_config()?);

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(cli.database_max_connections)
        .connect(&cli.database_uri)
        .await
        .context("connecting to the database")?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let ledger = PgLedgerRepository::new(pool.clone());
    let accrual = HttpAccrualClient::new(&loyalty_config.accrual)
        .context("building the accrual client")?;
    let sessions = Arc::new(SessionCache::new(auth_config.session_ttl));

    // Background tasks observe this channel; dropping the sender also stops them
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = AccrualPoller::new(
        Arc::new(ledger.clone()),
        Arc::new(accrual),
        loyalty_config.poller.clone(),
    )
    .spawn(shutdown_rx.clone());
    let sweeper = sessions.spawn_sweeper(shutdown_rx.clone());

    // Build router
    let protected = loyalty_router(ledger.clone()).route_layer(from_fn_with_state(
        auth_middleware_state(sessions.clone(), auth_config.clone()),
        require_auth,
    ));

    let user_api = auth_router(
        PgUserRepository::new(pool.clone()),
        LedgerAccounts::new(ledger),
        sessions,
        auth_config,
    )
    .merge(protected);

    let app = Router::new()
        .nest("/api/user", user_api)
        .layer(CompressionLayer::new())
        .layer(RequestDecompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = TcpListener::bind(&cli.run_address)
        .await
        .with_context(|| format!("binding {}", cli.run_address))?;
    tracing::info!(
        address = %listener.local_addr()?,
        accrual = %loyalty_config.accrual.base_url,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    if let Err(e) = poller.await {
        tracing::error!(error = %e, "Accrual poller task failed");
    }
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "Session sweeper task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM, after telling background tasks to stop.
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
    // receivers are still held by main, so this cannot fail
    let _ = shutdown.send(true);
}
