//! API key handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_entity::api_key::ApiKey;

use crate::dto::request::CreateApiKeyBody;
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ApiKey>>>, AppError> {
    let keys = state.api_key_service.list(&auth).await?;
    Ok(Json(ApiResponse::ok(keys)))
}

/// POST /api/api-keys
///
/// The raw key is in this response only.
pub async fn create_api_key(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateApiKeyBody>,
) -> Result<Response, AppError> {
    let created = state.api_key_service.create(&auth, req.into()).await?;
    Ok(ApiResponse::created(created))
}

/// DELETE /api/api-keys/{id}
pub async fn revoke_api_key(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ApiKey>>, AppError> {
    let key = state.api_key_service.revoke(&auth, id).await?;
    Ok(Json(ApiResponse::ok(key)))
}
