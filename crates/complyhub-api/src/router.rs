//! Route definitions for the ComplyHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
};

use crate::handlers;
use crate::handlers::webhook::{delivery, endpoint, event, incoming};
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes, the body limit and request logging.
///
/// CORS, compression and tracing are added by [`crate::app::build_app`].
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_bytes;

    let api_routes = Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(api_key_routes())
        .merge(endpoint_routes())
        .merge(event_routes())
        .merge(delivery_routes())
        .merge(incoming_routes())
        .merge(action_routes())
        .merge(knowledge_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Liveness, readiness and the API description
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
        .route("/openapi.json", get(handlers::openapi::openapi_document))
}

/// Email sign-up, sign-in and the current caller
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up/email", post(handlers::auth::sign_up))
        .route("/auth/sign-in/email", post(handlers::auth::sign_in))
        .route("/auth/me", get(handlers::auth::me))
}

/// Organisation API keys
fn api_key_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api-keys",
            get(handlers::api_key::list_api_keys).post(handlers::api_key::create_api_key),
        )
        .route("/api-keys/{id}", delete(handlers::api_key::revoke_api_key))
}

/// Endpoint registry
fn endpoint_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/webhooks/endpoints",
            get(endpoint::list_endpoints).post(endpoint::register_endpoint),
        )
        .route(
            "/webhooks/endpoints/{id}",
            get(endpoint::get_endpoint)
                .patch(endpoint::update_endpoint)
                .delete(endpoint::disable_endpoint),
        )
        .route(
            "/webhooks/endpoints/{id}/suspend",
            post(endpoint::suspend_endpoint),
        )
        .route(
            "/webhooks/endpoints/{id}/resume",
            post(endpoint::resume_endpoint),
        )
        .route(
            "/webhooks/endpoints/{id}/deliveries",
            get(endpoint::list_endpoint_deliveries),
        )
}

/// Event log and manual fan-out
fn event_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/webhooks/events",
            get(event::list_events).post(event::record_event),
        )
        .route("/webhooks/events/{id}", get(event::get_event))
        .route(
            "/webhooks/events/{id}/deliveries",
            get(event::list_event_deliveries),
        )
        .route("/webhooks/events/{id}/fan-out", post(event::fan_out_event))
}

/// Delivery inspection
fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/deliveries/stats", get(delivery::delivery_stats))
        .route("/webhooks/deliveries/{id}", get(delivery::get_delivery))
}

/// Inbound webhooks and their replay queue.
///
/// `{id}` is the source label on the unauthenticated `POST`; a path segment
/// takes a single parameter name.
fn incoming_routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/incoming", get(incoming::list_incoming))
        .route("/webhooks/incoming/{id}", post(incoming::receive_incoming))
        .route(
            "/webhooks/incoming/{id}/processed",
            post(incoming::mark_incoming_processed),
        )
        .route(
            "/webhooks/incoming/{id}/failed",
            post(incoming::mark_incoming_failed),
        )
}

/// Remedial actions kanban
fn action_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/actions",
            get(handlers::action::list_actions).post(handlers::action::create_action),
        )
        .route(
            "/actions/{id}",
            get(handlers::action::get_action).patch(handlers::action::update_action_status),
        )
        .route(
            "/actions/{id}/advance",
            post(handlers::action::advance_action),
        )
}

/// Knowledge base CRUD
fn knowledge_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/knowledge",
            get(handlers::knowledge::list_articles).post(handlers::knowledge::create_article),
        )
        .route(
            "/knowledge/{id}",
            get(handlers::knowledge::get_article)
                .put(handlers::knowledge::update_article)
                .delete(handlers::knowledge::delete_article),
        )
}
