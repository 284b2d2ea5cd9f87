//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Webhook delivery worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of deliveries dispatched concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between polls for due deliveries.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum number of unprocessed events fanned out per poll.
    #[serde(default = "default_fan_out_batch")]
    pub fan_out_batch_size: u32,
    /// Extra seconds a claim outlives the endpoint timeout before another
    /// worker may pick the delivery up again.
    #[serde(default = "default_claim_grace")]
    pub claim_grace_seconds: u64,
    /// Days to keep processed incoming webhook logs.
    #[serde(default = "default_incoming_retention")]
    pub incoming_retention_days: u32,
    /// Cron expression (with seconds) for the incoming-log purge.
    #[serde(default = "default_purge_schedule")]
    pub purge_schedule: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
            fan_out_batch_size: default_fan_out_batch(),
            claim_grace_seconds: default_claim_grace(),
            incoming_retention_days: default_incoming_retention(),
            purge_schedule: default_purge_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    8
}

fn default_poll_interval() -> u64 {
    5
}

fn default_fan_out_batch() -> u32 {
    100
}

fn default_claim_grace() -> u64 {
    30
}

fn default_incoming_retention() -> u32 {
    30
}

fn default_purge_schedule() -> String {
    "0 30 3 * * *".to_string()
}
