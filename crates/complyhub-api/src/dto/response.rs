//! Response DTOs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use complyhub_auth::Capability;
use complyhub_entity::user::User;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    /// Wraps `data` and answers `201 Created`.
    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, Json(Self::ok(data))).into_response()
    }

    /// Wraps `data` and answers `202 Accepted`.
    pub fn accepted(data: T) -> Response {
        (StatusCode::ACCEPTED, Json(Self::ok(data))).into_response()
    }
}

/// Liveness payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
}

/// Readiness payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: u64,
    /// `connected`, `unavailable` or `in_memory`.
    pub database: String,
    /// Whether the delivery worker runs in this process.
    pub worker_enabled: bool,
    /// Configured worker concurrency.
    pub worker_concurrency: usize,
}

/// `GET /api/auth/me`
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// The signed-in user, or the creator of the API key in use.
    pub user: User,
    /// Capabilities the caller holds.
    pub capabilities: Vec<Capability>,
    /// Set when the request authenticated with an API key.
    pub api_key_id: Option<Uuid>,
}

/// Acknowledgement for an accepted inbound webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingAccepted {
    /// Log entry id.
    pub id: Uuid,
    /// Always `true`.
    pub received: bool,
    /// When the entry was stored.
    pub received_at: DateTime<Utc>,
}

/// Acknowledgement for a hard delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    /// Deleted id.
    pub id: Uuid,
    /// Always `true`.
    pub deleted: bool,
}
