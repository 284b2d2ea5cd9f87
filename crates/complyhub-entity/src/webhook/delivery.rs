//! Webhook delivery entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::DeliveryStatus;

/// One event sent to one endpoint, with its own retry state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookDelivery {
    /// Unique delivery identifier.
    pub id: Uuid,
    /// Destination endpoint.
    pub webhook_endpoint_id: Uuid,
    /// Event being delivered.
    pub event_id: Uuid,
    /// Delivery status.
    pub status: DeliveryStatus,
    /// Attempts made so far.
    pub attempt_count: i32,
    /// When the last attempt finished.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Earliest time of the next attempt. Set only while `RETRYING`.
    pub next_retry_at: Option<DateTime<Utc>>,
    /// HTTP status of the last response, if any.
    pub response_status: Option<i32>,
    /// Truncated body of the last response.
    pub response_body: Option<String>,
    /// Duration of the last attempt in milliseconds.
    pub duration_ms: Option<i64>,
    /// Error of the last failed attempt.
    pub error_message: Option<String>,
    /// A worker holds the row until this instant.
    pub claimed_until: Option<DateTime<Utc>>,
    /// When the delivery was created.
    pub created_at: DateTime<Utc>,
    /// When the delivery was last updated.
    pub updated_at: DateTime<Utc>,
}

impl WebhookDelivery {
    /// A fresh `PENDING` delivery.
    pub fn pending(webhook_endpoint_id: Uuid, event_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            webhook_endpoint_id,
            event_id,
            status: DeliveryStatus::Pending,
            attempt_count: 0,
            last_attempt_at: None,
            next_retry_at: None,
            response_status: None,
            response_body: None,
            duration_ms: None,
            error_message: None,
            claimed_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a worker may pick this delivery up at `now`, ignoring the
    /// endpoint status.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let claimed = self.claimed_until.is_some_and(|until| until > now);
        if claimed {
            return false;
        }
        match self.status {
            DeliveryStatus::Pending => true,
            DeliveryStatus::Retrying => self.next_retry_at.is_none_or(|at| at <= now),
            DeliveryStatus::Sent | DeliveryStatus::Failed => false,
        }
    }
}

/// Delivery counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    /// `PENDING` deliveries.
    pub pending: i64,
    /// `RETRYING` deliveries.
    pub retrying: i64,
    /// `SENT` deliveries.
    pub sent: i64,
    /// `FAILED` deliveries.
    pub failed: i64,
}

impl DeliveryStats {
    /// Add `count` deliveries of `status`.
    pub fn add(&mut self, status: DeliveryStatus, count: i64) {
        match status {
            DeliveryStatus::Pending => self.pending += count,
            DeliveryStatus::Retrying => self.retrying += count,
            DeliveryStatus::Sent => self.sent += count,
            DeliveryStatus::Failed => self.failed += count,
        }
    }

    /// Total number of deliveries.
    pub fn total(&self) -> i64 {
        self.pending + self.retrying + self.sent + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_pending_is_due() {
        let now = Utc::now();
        let delivery = WebhookDelivery::pending(Uuid::new_v4(), Uuid::new_v4(), now);
        assert!(delivery.is_due(now));
    }

    #[test]
    fn test_claimed_delivery_is_not_due() {
        let now = Utc::now();
        let mut delivery = WebhookDelivery::pending(Uuid::new_v4(), Uuid::new_v4(), now);
        delivery.claimed_until = Some(now + Duration::seconds(30));
        assert!(!delivery.is_due(now));
        assert!(delivery.is_due(now + Duration::seconds(31)));
    }

    #[test]
    fn test_retrying_waits_for_next_retry() {
        let now = Utc::now();
        let mut delivery = WebhookDelivery::pending(Uuid::new_v4(), Uuid::new_v4(), now);
        delivery.status = DeliveryStatus::Retrying;
        delivery.next_retry_at = Some(now + Duration::seconds(4));
        assert!(!delivery.is_due(now));
        assert!(delivery.is_due(now + Duration::seconds(4)));
    }

    #[test]
    fn test_stats_total() {
        let mut stats = DeliveryStats::default();
        stats.add(DeliveryStatus::Sent, 3);
        stats.add(DeliveryStatus::Failed, 1);
        assert_eq!(stats.total(), 4);
    }
}
