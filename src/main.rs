//! ComplyHub Server: property compliance webhooks, actions and knowledge.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use complyhub_api::{AppState, build_app};
use complyhub_core::config::AppConfig;
use complyhub_core::error::AppError;
use complyhub_database::{DatabasePool, Stores};
use complyhub_worker::{CronScheduler, DeliverySender, WebhookDispatcher, WorkerRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("COMPLYHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ComplyHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let database = DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        complyhub_database::migration::run_migrations(database.pool()).await?;
    }

    // ── Step 2: Stores and services ──────────────────────────────
    let stores = Stores::postgres(database.pool().clone());
    let state = AppState::new(config.clone(), stores, Some(database.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 3: Delivery worker ──────────────────────────────────
    let worker_handle = if config.worker.enabled {
        let sender: Arc<dyn DeliverySender> = Arc::new(WebhookDispatcher::new(&config.webhooks)?);
        let runner = WorkerRunner::new(
            Arc::clone(&state.delivery_tracker),
            sender,
            config.worker.clone(),
            format!("worker-{}", uuid::Uuid::new_v4()),
        );
        let rx = shutdown_rx.clone();
        Some(tokio::spawn(async move { runner.run(rx).await }))
    } else {
        tracing::info!("Delivery worker disabled");
        None
    };

    // ── Step 4: Scheduled maintenance ────────────────────────────
    let mut scheduler =
        CronScheduler::new((*state.incoming_log).clone(), config.worker.clone()).await?;
    scheduler.register_default_tasks().await?;
    scheduler.start().await?;

    // ── Step 5: HTTP server ──────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| AppError::configuration(format!("Invalid server address: {e}")))?;
    let app = build_app(state, &config.server.cors);

    let mut server = tokio::spawn(complyhub_api::serve(app, addr, shutdown_rx));

    // ── Step 6: Wait for shutdown ────────────────────────────────
    let early_exit = tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            None
        }
        joined = &mut server => Some(joined),
    };
    let _ = shutdown_tx.send(true);

    let joined = match early_exit {
        Some(joined) => Some(joined),
        None => {
            let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
            tokio::time::timeout(grace, &mut server).await.ok()
        }
    };
    let server_result = match joined {
        Some(Ok(result)) => result,
        Some(Err(e)) => Err(AppError::internal(format!("HTTP server task failed: {e}"))),
        None => {
            tracing::warn!("HTTP server did not stop within the grace period");
            server.abort();
            Ok(())
        }
    };

    if let Some(handle) = worker_handle
        && let Err(e) = handle.await
    {
        tracing::error!(error = %e, "Worker task panicked");
    }

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler shutdown failed");
    }

    database.close().await;
    tracing::info!("ComplyHub stopped");
    server_result
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
