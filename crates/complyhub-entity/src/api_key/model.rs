//! API key entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::user::Role;

/// An organisation-scoped API key. Only the SHA-256 hash of the secret is
/// persisted; the raw key is returned once at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKey {
    /// Unique key identifier.
    pub id: Uuid,
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// Public lookup prefix embedded in the raw key.
    pub prefix: String,
    /// Hex-encoded SHA-256 of the full raw key.
    #[serde(skip_serializing)]
    pub key_hash: String,
    /// Role granted to requests authenticated with this key.
    pub role: Role,
    /// User who created the key.
    pub created_by: Uuid,
    /// Last time the key authenticated a request.
    pub last_used_at: Option<DateTime<Utc>>,
    /// When the key was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// When the key was created.
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Whether the key may still authenticate requests.
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// Data required to persist a new API key.
#[derive(Debug, Clone)]
pub struct CreateApiKey {
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// Public lookup prefix.
    pub prefix: String,
    /// Hex-encoded SHA-256 of the raw key.
    pub key_hash: String,
    /// Granted role.
    pub role: Role,
    /// Creating user.
    pub created_by: Uuid,
}
