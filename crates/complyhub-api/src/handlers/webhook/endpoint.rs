//! Webhook endpoint handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_core::types::PageResponse;
use complyhub_entity::webhook::{WebhookDelivery, WebhookEndpoint};

use super::{DeliveryStatusQuery, EndpointStatusQuery};
use crate::dto::request::{RegisterEndpointRequest, UpdateEndpointRequest};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/webhooks/endpoints
pub async fn list_endpoints(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<EndpointStatusQuery>,
) -> Result<Json<ApiResponse<PageResponse<WebhookEndpoint>>>, AppError> {
    let page = state
        .endpoint_registry
        .list(&auth, filter.status, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/webhooks/endpoints
pub async fn register_endpoint(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<RegisterEndpointRequest>,
) -> Result<Response, AppError> {
    let endpoint = state.endpoint_registry.register(&auth, req.into()).await?;
    Ok(ApiResponse::created(endpoint))
}

/// GET /api/webhooks/endpoints/{id}
pub async fn get_endpoint(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WebhookEndpoint>>, AppError> {
    let endpoint = state.endpoint_registry.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(endpoint)))
}

/// PATCH /api/webhooks/endpoints/{id}
pub async fn update_endpoint(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateEndpointRequest>,
) -> Result<Json<ApiResponse<WebhookEndpoint>>, AppError> {
    let endpoint = state
        .endpoint_registry
        .update(&auth, id, req.into())
        .await?;
    Ok(Json(ApiResponse::ok(endpoint)))
}

/// DELETE /api/webhooks/endpoints/{id}
///
/// Soft delete: the endpoint is set to `DISABLED` and its history kept.
pub async fn disable_endpoint(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WebhookEndpoint>>, AppError> {
    let endpoint = state.endpoint_registry.disable(&auth, id).await?;
    Ok(Json(ApiResponse::ok(endpoint)))
}

/// POST /api/webhooks/endpoints/{id}/suspend
pub async fn suspend_endpoint(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WebhookEndpoint>>, AppError> {
    let endpoint = state.endpoint_registry.suspend(&auth, id).await?;
    Ok(Json(ApiResponse::ok(endpoint)))
}

/// POST /api/webhooks/endpoints/{id}/resume
pub async fn resume_endpoint(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WebhookEndpoint>>, AppError> {
    let endpoint = state.endpoint_registry.resume(&auth, id).await?;
    Ok(Json(ApiResponse::ok(endpoint)))
}

/// GET /api/webhooks/endpoints/{id}/deliveries
pub async fn list_endpoint_deliveries(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<DeliveryStatusQuery>,
) -> Result<Json<ApiResponse<PageResponse<WebhookDelivery>>>, AppError> {
    let page = state
        .delivery_tracker
        .list_for_endpoint(&auth, id, filter.status, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}
