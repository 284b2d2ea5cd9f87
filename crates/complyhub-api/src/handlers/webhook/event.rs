//! Event log handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde_json::{Value, json};
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_core::types::PageResponse;
use complyhub_database::store::EventFilter;
use complyhub_entity::webhook::{WebhookDelivery, WebhookEvent};

use super::DeliveryStatusQuery;
use crate::dto::request::RecordEventRequest;
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/webhooks/events
pub async fn list_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<ApiResponse<PageResponse<WebhookEvent>>>, AppError> {
    let page = state
        .event_log
        .list(&auth, &filter, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/webhooks/events
///
/// Records the event only; the delivery worker fans it out.
pub async fn record_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<RecordEventRequest>,
) -> Result<Response, AppError> {
    let event = state.event_log.record(&auth, req.into()).await?;
    Ok(ApiResponse::created(event))
}

/// GET /api/webhooks/events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WebhookEvent>>, AppError> {
    let event = state.event_log.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(event)))
}

/// GET /api/webhooks/events/{id}/deliveries
pub async fn list_event_deliveries(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(filter): Query<DeliveryStatusQuery>,
) -> Result<Json<ApiResponse<Vec<WebhookDelivery>>>, AppError> {
    let deliveries = state
        .delivery_tracker
        .list_for_event(&auth, id, filter.status)
        .await?;
    Ok(Json(ApiResponse::ok(deliveries)))
}

/// POST /api/webhooks/events/{id}/fan-out
///
/// Schedules deliveries now instead of waiting for the next worker sweep.
/// Only deliveries created by this call are returned.
pub async fn fan_out_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let deliveries = state.delivery_tracker.fan_out_for(&auth, id).await?;
    Ok(Json(ApiResponse::ok(json!({
        "event_id": id,
        "created": deliveries.len(),
        "deliveries": deliveries,
    }))))
}
