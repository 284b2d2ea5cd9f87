//! Webhook event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable record of a domain occurrence eligible for fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Organisation the event belongs to.
    pub organisation_id: Uuid,
    /// Dotted event type, e.g. `action.created`.
    pub event_type: String,
    /// Kind of entity the event is about.
    pub entity_type: String,
    /// Identifier of that entity.
    pub entity_id: String,
    /// Event body. Never mutated after creation.
    pub payload: serde_json::Value,
    /// Whether fan-out has completed.
    pub processed: bool,
    /// When fan-out completed.
    pub processed_at: Option<DateTime<Utc>>,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Data required to record an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWebhookEvent {
    /// Organisation.
    pub organisation_id: Uuid,
    /// Event type.
    pub event_type: String,
    /// Entity kind.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: String,
    /// Body.
    pub payload: serde_json::Value,
}
