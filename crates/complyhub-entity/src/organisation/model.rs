//! Organisation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tenant. Every endpoint, event, action and article belongs to one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organisation {
    /// Unique organisation identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// When the organisation was created.
    pub created_at: DateTime<Utc>,
}
