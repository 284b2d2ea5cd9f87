//! Incoming webhook log entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Raw record of an inbound call from an external system, kept regardless
/// of processing outcome.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IncomingWebhookLog {
    /// Unique log identifier.
    pub id: Uuid,
    /// Sending system, taken from the request path.
    pub source: String,
    /// Event type reported by the sender, if any.
    pub event_type: Option<String>,
    /// Request body. Non-JSON bodies are stored as a JSON string.
    pub payload: serde_json::Value,
    /// Request headers with credentials redacted.
    pub headers: serde_json::Value,
    /// Whether downstream processing succeeded.
    pub processed: bool,
    /// Set exactly when `processed` is true.
    pub processed_at: Option<DateTime<Utc>>,
    /// Last processing error, kept for replay.
    pub error_message: Option<String>,
    /// When the call was received.
    pub created_at: DateTime<Utc>,
}

/// Data required to log an inbound call.
#[derive(Debug, Clone)]
pub struct CreateIncomingWebhookLog {
    /// Sending system.
    pub source: String,
    /// Reported event type.
    pub event_type: Option<String>,
    /// Body.
    pub payload: serde_json::Value,
    /// Redacted headers.
    pub headers: serde_json::Value,
}
