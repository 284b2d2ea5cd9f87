//! Webhook endpoint entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{EndpointStatus, WebhookAuthType};
use super::subscription;

/// A registered destination for outbound notifications.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookEndpoint {
    /// Unique endpoint identifier.
    pub id: Uuid,
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Human-readable label.
    pub name: String,
    /// Absolute http(s) destination URL.
    pub url: String,
    /// Outbound authentication method.
    pub auth_type: WebhookAuthType,
    /// Credential or signing secret for `auth_type`.
    #[serde(skip_serializing)]
    pub auth_value: Option<String>,
    /// Subscription patterns (never empty).
    pub events: Vec<String>,
    /// Lifecycle status.
    pub status: EndpointStatus,
    /// Attempt budget per delivery.
    pub retry_count: i32,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: i32,
    /// Permanently failed deliveries since the last success or resume.
    pub failure_count: i32,
    /// Last successful delivery.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Last permanently failed delivery.
    pub last_failure_at: Option<DateTime<Utc>>,
    /// User who registered the endpoint.
    pub created_by: Option<Uuid>,
    /// When the endpoint was registered.
    pub created_at: DateTime<Utc>,
    /// When the endpoint was last updated.
    pub updated_at: DateTime<Utc>,
}

impl WebhookEndpoint {
    /// Whether this endpoint subscribes to `event_type`.
    pub fn subscribes_to(&self, event_type: &str) -> bool {
        subscription::any_matches(&self.events, event_type)
    }

    /// Whether fan-out should create a delivery for `event_type`.
    pub fn accepts(&self, event_type: &str) -> bool {
        self.status.is_dispatchable() && self.subscribes_to(event_type)
    }

    /// Request timeout as a std duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms.max(0) as u64)
    }

    /// Snapshot of the operator-editable fields.
    pub fn config(&self) -> EndpointConfig {
        EndpointConfig {
            name: self.name.clone(),
            url: self.url.clone(),
            auth_type: self.auth_type,
            auth_value: self.auth_value.clone(),
            events: self.events.clone(),
            retry_count: self.retry_count,
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Operator-editable endpoint fields, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Label.
    pub name: String,
    /// Destination URL.
    pub url: String,
    /// Auth method.
    pub auth_type: WebhookAuthType,
    /// Credential.
    pub auth_value: Option<String>,
    /// Subscription patterns.
    pub events: Vec<String>,
    /// Attempt budget.
    pub retry_count: i32,
    /// Timeout in milliseconds.
    pub timeout_ms: i32,
}
