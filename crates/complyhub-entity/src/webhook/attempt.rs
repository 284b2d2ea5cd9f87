//! Delivery attempt bookkeeping.
//!
//! [`plan_attempt`] is the whole delivery state machine. Storage backends
//! load the delivery and its endpoint under a lock, ask for a plan, and write
//! the plan back, so every backend makes the same transitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use complyhub_core::AppError;
use complyhub_core::config::WebhookConfig;

use super::delivery::WebhookDelivery;
use super::endpoint::WebhookEndpoint;
use super::status::{DeliveryStatus, EndpointStatus};

/// Backoff and endpoint-failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay unit in seconds.
    pub base_delay_seconds: u64,
    /// Cap on a single delay in seconds.
    pub max_delay_seconds: u64,
    /// Permanent failures before an active endpoint is set to `FAILED`.
    /// `0` disables the rule.
    pub failure_threshold: u32,
}

impl RetryPolicy {
    /// Build the policy from the `[webhooks]` configuration section.
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            base_delay_seconds: config.base_delay_seconds,
            max_delay_seconds: config.max_delay_seconds,
            failure_threshold: config.failure_threshold,
        }
    }

    /// Delay before the attempt following `attempt_count` failed attempts:
    /// `min(base * 2^attempt_count, max)`.
    pub fn backoff(&self, attempt_count: i32) -> Duration {
        let exponent = attempt_count.clamp(0, 63) as u32;
        let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        let seconds = self
            .base_delay_seconds
            .saturating_mul(factor)
            .min(self.max_delay_seconds);
        Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX))
    }

    /// Whether `failure_count` permanent failures trip the endpoint.
    pub fn trips(&self, failure_count: i32) -> bool {
        self.failure_threshold > 0 && i64::from(failure_count) >= i64::from(self.failure_threshold)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&WebhookConfig::default())
    }
}

/// Result of one HTTP attempt, as observed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The endpoint answered 2xx.
    Success {
        /// HTTP status code.
        response_status: i32,
        /// Truncated response body.
        response_body: Option<String>,
        /// Round-trip time.
        duration_ms: i64,
    },
    /// Non-2xx answer, timeout or transport error.
    Failure {
        /// HTTP status code, absent for timeouts and transport errors.
        response_status: Option<i32>,
        /// Truncated response body.
        response_body: Option<String>,
        /// Time until the failure was observed.
        duration_ms: Option<i64>,
        /// What went wrong.
        error_message: String,
    },
}

impl AttemptOutcome {
    /// Whether the attempt succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// What an attempt does to the owning endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointEffect {
    /// Nothing changes (the delivery will be retried).
    Unchanged,
    /// Successful delivery: failure count back to zero.
    Succeeded {
        /// New `last_success_at`.
        at: DateTime<Utc>,
    },
    /// The delivery failed permanently.
    Failed {
        /// New `failure_count`.
        failure_count: i32,
        /// New `last_failure_at`.
        at: DateTime<Utc>,
        /// New endpoint status when the threshold tripped.
        status: Option<EndpointStatus>,
    },
}

/// Every column an attempt writes, computed before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptPlan {
    /// New delivery status.
    pub status: DeliveryStatus,
    /// New attempt count.
    pub attempt_count: i32,
    /// When the attempt was recorded.
    pub last_attempt_at: DateTime<Utc>,
    /// Set only when `status` is `RETRYING`.
    pub next_retry_at: Option<DateTime<Utc>>,
    /// HTTP status, if any.
    pub response_status: Option<i32>,
    /// Response body, if any.
    pub response_body: Option<String>,
    /// Attempt duration.
    pub duration_ms: Option<i64>,
    /// Error message for failures.
    pub error_message: Option<String>,
    /// Endpoint side effect.
    pub endpoint: EndpointEffect,
}

impl AttemptPlan {
    /// Write the plan into a delivery row. Releases the worker claim.
    pub fn apply_to_delivery(&self, delivery: &mut WebhookDelivery) {
        delivery.status = self.status;
        delivery.attempt_count = self.attempt_count;
        delivery.last_attempt_at = Some(self.last_attempt_at);
        delivery.next_retry_at = self.next_retry_at;
        delivery.response_status = self.response_status;
        delivery.response_body = self.response_body.clone();
        delivery.duration_ms = self.duration_ms;
        delivery.error_message = self.error_message.clone();
        delivery.claimed_until = None;
        delivery.updated_at = self.last_attempt_at;
    }

    /// Write the endpoint side effect into an endpoint row.
    pub fn apply_to_endpoint(&self, endpoint: &mut WebhookEndpoint) {
        match self.endpoint {
            EndpointEffect::Unchanged => {}
            EndpointEffect::Succeeded { at } => {
                endpoint.failure_count = 0;
                endpoint.last_success_at = Some(at);
                endpoint.updated_at = at;
            }
            EndpointEffect::Failed {
                failure_count,
                at,
                status,
            } => {
                endpoint.failure_count = failure_count;
                endpoint.last_failure_at = Some(at);
                if let Some(status) = status {
                    endpoint.status = status;
                }
                endpoint.updated_at = at;
            }
        }
    }
}

/// Compute the effect of recording `outcome` against `delivery`.
///
/// Fails with `Conflict` when the delivery is already terminal.
pub fn plan_attempt(
    delivery: &WebhookDelivery,
    endpoint: &WebhookEndpoint,
    outcome: &AttemptOutcome,
    policy: &RetryPolicy,
    now: DateTime<Utc>,
) -> Result<AttemptPlan, AppError> {
    if delivery.status.is_terminal() {
        return Err(AppError::conflict(format!(
            "Delivery {} is already {}",
            delivery.id, delivery.status
        )));
    }

    // A delivery whose budget was already spent, for example after the
    // endpoint's retry count was lowered, fails without another attempt.
    let budget = endpoint.retry_count.max(1);
    let exhausted = delivery.attempt_count >= budget;
    let attempt_count = if exhausted {
        delivery.attempt_count
    } else {
        delivery.attempt_count + 1
    };

    let plan = match outcome {
        AttemptOutcome::Success {
            response_status,
            response_body,
            duration_ms,
        } => AttemptPlan {
            status: DeliveryStatus::Sent,
            attempt_count,
            last_attempt_at: now,
            next_retry_at: None,
            response_status: Some(*response_status),
            response_body: response_body.clone(),
            duration_ms: Some(*duration_ms),
            error_message: None,
            endpoint: EndpointEffect::Succeeded { at: now },
        },
        AttemptOutcome::Failure {
            response_status,
            response_body,
            duration_ms,
            error_message,
        } => {
            let retry = !exhausted && attempt_count < endpoint.retry_count;
            let (status, next_retry_at, effect) = if retry {
                (
                    DeliveryStatus::Retrying,
                    Some(now + policy.backoff(attempt_count)),
                    EndpointEffect::Unchanged,
                )
            } else {
                let failure_count = endpoint.failure_count.saturating_add(1);
                let trip = endpoint.status == EndpointStatus::Active && policy.trips(failure_count);
                (
                    DeliveryStatus::Failed,
                    None,
                    EndpointEffect::Failed {
                        failure_count,
                        at: now,
                        status: trip.then_some(EndpointStatus::Failed),
                    },
                )
            };
            AttemptPlan {
                status,
                attempt_count,
                last_attempt_at: now,
                next_retry_at,
                response_status: *response_status,
                response_body: response_body.clone(),
                duration_ms: *duration_ms,
                error_message: Some(error_message.clone()),
                endpoint: effect,
            }
        }
    };

    Ok(plan)
}
