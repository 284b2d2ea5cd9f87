//! Webhook status and auth-type enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a webhook endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "webhook_endpoint_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointStatus {
    /// Receives deliveries.
    Active,
    /// Suspended by an operator.
    Paused,
    /// Suspended automatically after repeated permanent failures.
    Failed,
    /// Revoked. Terminal; history is kept.
    Disabled,
}

impl EndpointStatus {
    /// Only active endpoints are matched at fan-out and dispatched to.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Check if an operator may suspend the endpoint.
    pub fn can_suspend(&self) -> bool {
        matches!(self, Self::Active | Self::Paused | Self::Failed)
    }

    /// Check if an operator may resume the endpoint.
    pub fn can_resume(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Failed => "FAILED",
            Self::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of one delivery of one event to one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "webhook_delivery_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Created at fan-out, never attempted.
    Pending,
    /// Delivered (2xx). Terminal.
    Sent,
    /// Attempt budget exhausted. Terminal.
    Failed,
    /// Waiting for `next_retry_at`.
    Retrying,
}

impl DeliveryStatus {
    /// All statuses.
    pub const ALL: [DeliveryStatus; 4] = [Self::Pending, Self::Sent, Self::Failed, Self::Retrying];

    /// Check if the delivery is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
            Self::Retrying => "RETRYING",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How outbound requests to an endpoint are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "webhook_auth_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookAuthType {
    /// No credentials.
    None,
    /// `Authorization: Bearer <value>`.
    Bearer,
    /// `Authorization: Basic base64(<value>)`, value is `user:password`.
    Basic,
    /// `X-API-Key: <value>`.
    ApiKey,
    /// HMAC-SHA256 signature of the body keyed with the value.
    #[sqlx(rename = "HMAC_SHA256")]
    #[serde(rename = "HMAC_SHA256")]
    HmacSha256,
}

impl WebhookAuthType {
    /// Whether an `auth_value` must accompany this auth type.
    pub fn requires_value(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Return the auth type as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Bearer => "BEARER",
            Self::Basic => "BASIC",
            Self::ApiKey => "API_KEY",
            Self::HmacSha256 => "HMAC_SHA256",
        }
    }
}

impl fmt::Display for WebhookAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
