//! Knowledge base handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_core::types::PageResponse;
use complyhub_database::store::KnowledgeFilter;
use complyhub_entity::knowledge::KnowledgeArticle;

use crate::dto::request::KnowledgeRequest;
use crate::dto::response::{ApiResponse, DeletedResponse};
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/knowledge
pub async fn list_articles(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<KnowledgeFilter>,
) -> Result<Json<ApiResponse<PageResponse<KnowledgeArticle>>>, AppError> {
    let page = state
        .knowledge_service
        .list(&auth, &filter, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/knowledge
pub async fn create_article(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<KnowledgeRequest>,
) -> Result<Response, AppError> {
    let article = state.knowledge_service.create(&auth, req.into()).await?;
    Ok(ApiResponse::created(article))
}

/// GET /api/knowledge/{id}
pub async fn get_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<KnowledgeArticle>>, AppError> {
    let article = state.knowledge_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(article)))
}

/// PUT /api/knowledge/{id}
pub async fn update_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<KnowledgeRequest>,
) -> Result<Json<ApiResponse<KnowledgeArticle>>, AppError> {
    let article = state
        .knowledge_service
        .update(&auth, id, req.into())
        .await?;
    Ok(Json(ApiResponse::ok(article)))
}

/// DELETE /api/knowledge/{id}
pub async fn delete_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AppError> {
    state.knowledge_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(DeletedResponse { id, deleted: true })))
}
