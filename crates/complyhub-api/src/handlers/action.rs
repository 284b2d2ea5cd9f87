//! Remedial action handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_core::types::PageResponse;
use complyhub_database::store::ActionFilter;
use complyhub_entity::action::RemedialAction;

use crate::dto::request::{CreateActionRequest, UpdateActionRequest};
use crate::dto::response::ApiResponse;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/actions
pub async fn list_actions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<ActionFilter>,
) -> Result<Json<ApiResponse<PageResponse<RemedialAction>>>, AppError> {
    let page = state
        .action_service
        .list(&auth, &filter, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/actions
pub async fn create_action(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateActionRequest>,
) -> Result<Response, AppError> {
    let action = state.action_service.create(&auth, req.into()).await?;
    Ok(ApiResponse::created(action))
}

/// GET /api/actions/{id}
pub async fn get_action(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RemedialAction>>, AppError> {
    let action = state.action_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(action)))
}

/// PATCH /api/actions/{id}
pub async fn update_action_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateActionRequest>,
) -> Result<Json<ApiResponse<RemedialAction>>, AppError> {
    let action = state
        .action_service
        .update_status(&auth, id, req.status)
        .await?;
    Ok(Json(ApiResponse::ok(action)))
}

/// POST /api/actions/{id}/advance
///
/// Moves the action one column along the forward path.
pub async fn advance_action(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RemedialAction>>, AppError> {
    let action = state.action_service.advance(&auth, id).await?;
    Ok(Json(ApiResponse::ok(action)))
}
