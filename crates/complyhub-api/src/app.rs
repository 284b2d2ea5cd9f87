//! Application builder: wires router, middleware and state into an Axum app
//! and serves it until shutdown is signalled.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use complyhub_core::config::CorsConfig;
use complyhub_core::error::AppError;

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, cors_config: &CorsConfig) -> Router {
    build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(build_cors_layer(cors_config))
            .layer(build_compression_layer()),
    )
}

/// Binds `addr` and serves `app` until `shutdown` flips to `true`.
pub async fn serve(
    app: Router,
    addr: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    break;
                }
            }
            tracing::info!("HTTP server draining connections");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
