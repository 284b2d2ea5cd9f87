//! Delivery handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_entity::webhook::{DeliveryStats, WebhookDelivery};

use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/webhooks/deliveries/{id}
pub async fn get_delivery(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WebhookDelivery>>, AppError> {
    let delivery = state.delivery_tracker.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(delivery)))
}

/// GET /api/webhooks/deliveries/stats
pub async fn delivery_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<DeliveryStats>>, AppError> {
    let stats = state.delivery_tracker.stats(&auth).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
