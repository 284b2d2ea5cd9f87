//! Auth handlers: email sign-up, sign-in and the current caller.

use axum::Json;
use axum::extract::State;
use axum::response::Response;

use complyhub_core::error::AppError;
use complyhub_service::auth::AuthSession;

use crate::dto::request::{SignInRequest, SignUpRequest};
use crate::dto::response::{ApiResponse, MeResponse};
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/sign-up/email
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> Result<Response, AppError> {
    let session = state.auth_service.sign_up(req.into()).await?;
    Ok(ApiResponse::created(session))
}

/// POST /api/auth/sign-in/email
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignInRequest>,
) -> Result<Json<ApiResponse<AuthSession>>, AppError> {
    let session = state.auth_service.sign_in(req.into()).await?;
    Ok(Json(ApiResponse::ok(session)))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<MeResponse>>, AppError> {
    let user = state.auth_service.me(&auth).await?;
    Ok(Json(ApiResponse::ok(MeResponse {
        user,
        capabilities: state.rbac.policies().capabilities(auth.role),
        api_key_id: auth.api_key_id,
    })))
}
