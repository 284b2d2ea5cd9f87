//! `AuthUser` extractor: resolves the caller from a bearer token or an API
//! key and injects a [`RequestContext`].

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use complyhub_core::error::AppError;
use complyhub_service::RequestContext;

use crate::state::AppState;

/// Header carrying a raw API key as an alternative to `Authorization`.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extracted authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(AUTHORIZATION) {
            let token = value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;
            let ctx = state.auth_service.authenticate(token).await?;
            return Ok(AuthUser(ctx));
        }

        if let Some(value) = parts.headers.get(API_KEY_HEADER) {
            let raw = value
                .to_str()
                .map_err(|_| AppError::authentication("Invalid API key"))?;
            let ctx = state.auth_service.authenticate_api_key(raw.trim()).await?;
            return Ok(AuthUser(ctx));
        }

        Err(AppError::authentication(
            "Missing Authorization or X-API-Key header",
        ))
    }
}
