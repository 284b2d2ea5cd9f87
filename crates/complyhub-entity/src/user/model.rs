//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::Role;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Login email, stored lowercase.
    pub email: String,
    /// Human-readable name.
    pub name: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role within the organisation.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Login email (already normalized to lowercase).
    pub email: String,
    /// Human-readable name.
    pub name: String,
    /// Argon2 password hash.
    pub password_hash: String,
    /// Role within the organisation.
    pub role: Role,
}
