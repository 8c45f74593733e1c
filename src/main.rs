//! DriveHub booking lifecycle worker
//!
//! Long-running background process: connects to the marketplace database,
//! runs migrations, and drives the booking expiration engine on a fixed
//! interval until the process is asked to shut down.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;

use drivehub_worker::config::Config;
use drivehub_worker::db;
use drivehub_worker::expiration::{run_expiration_checker, ExpirationService};
use drivehub_worker::notifications::PgNotificationDispatcher;
use drivehub_worker::payments::HttpRefundGateway;
use drivehub_worker::rentals::PgBookingStore;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    let db_pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = db::run_migrations(&db_pool).await {
        tracing::error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let store = PgBookingStore::new(db_pool.clone());
    let gateway = HttpRefundGateway::new(config.payments_base_url.clone());
    let notifier = PgNotificationDispatcher::new(db_pool.clone(), config.email_relay_url.clone());

    let engine = Arc::new(ExpirationService::new(
        store,
        gateway,
        notifier,
        config.expiration,
    ));

    let interval = Duration::from_secs(config.expiration.check_interval_minutes * 60);
    let checker = tokio::spawn(async move {
        run_expiration_checker(engine, interval).await;
    });

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping checker");
    checker.abort();

    tracing::info!("Worker shutdown complete");
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
