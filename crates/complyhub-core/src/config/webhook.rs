//! Webhook delivery policy configuration.
//!
//! Backoff and failure-threshold constants are deliberately configuration,
//! not code: operators tune them per deployment.

use serde::{Deserialize, Serialize};

/// Retry, backoff, and endpoint-failure policy for outbound webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Base delay for exponential backoff, in seconds.
    ///
    /// The delay after the n-th failed attempt is `base * 2^n`, capped at
    /// `max_delay_seconds`.
    #[serde(default = "default_base_delay")]
    pub base_delay_seconds: u64,
    /// Upper bound for a single backoff delay, in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: u64,
    /// Number of permanently failed deliveries after which an active
    /// endpoint is moved to `FAILED`. `0` disables the rule.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Retry count used when a registration does not specify one.
    #[serde(default = "default_retry_count")]
    pub default_retry_count: i32,
    /// Request timeout used when a registration does not specify one.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: i32,
    /// Maximum number of response-body bytes stored per attempt.
    #[serde(default = "default_response_body_limit")]
    pub max_response_body_bytes: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            base_delay_seconds: default_base_delay(),
            max_delay_seconds: default_max_delay(),
            failure_threshold: default_failure_threshold(),
            default_retry_count: default_retry_count(),
            default_timeout_ms: default_timeout_ms(),
            max_response_body_bytes: default_response_body_limit(),
        }
    }
}

fn default_base_delay() -> u64 {
    1
}

fn default_max_delay() -> u64 {
    3600
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_retry_count() -> i32 {
    3
}

fn default_timeout_ms() -> i32 {
    30_000
}

fn default_response_body_limit() -> usize {
    2048
}
