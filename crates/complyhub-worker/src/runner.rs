//! Worker runner: the delivery loop.
//!
//! Each tick fans out unprocessed events, claims as many due deliveries as
//! there are free dispatch slots, and dispatches each claim on its own task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::time;

use complyhub_core::config::WorkerConfig;
use complyhub_database::store::ClaimedDelivery;
use complyhub_service::DeliveryTracker;

use crate::dispatcher::DeliverySender;

/// How long shutdown waits for in-flight dispatches.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Polls for due deliveries and dispatches them with bounded concurrency.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Fan-out and attempt bookkeeping.
    tracker: Arc<DeliveryTracker>,
    /// Performs the HTTP call.
    sender: Arc<dyn DeliverySender>,
    /// Worker configuration.
    config: WorkerConfig,
    /// Worker identifier for logs.
    worker_id: String,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(
        tracker: Arc<DeliveryTracker>,
        sender: Arc<dyn DeliverySender>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            tracker,
            sender,
            config,
            worker_id,
        }
    }

    /// Run until the cancel signal is received, then wait for in-flight
    /// dispatches.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            worker_id = %self.worker_id,
            concurrency = self.config.concurrency,
            poll_interval_seconds = self.config.poll_interval_seconds,
            "Delivery worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.slots()));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!(worker_id = %self.worker_id, "Worker received shutdown signal");
                        break;
                    }
                }
                _ = self.tick(&semaphore) => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                tracing::info!(worker_id = %self.worker_id, "Worker shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!(worker_id = %self.worker_id, "Waiting for in-flight deliveries");
        if !self.drain(&semaphore, SHUTDOWN_GRACE).await {
            tracing::warn!(
                worker_id = %self.worker_id,
                "In-flight deliveries still running at shutdown; their claims will expire"
            );
        }
        tracing::info!(worker_id = %self.worker_id, "Worker shut down complete");
    }

    /// One poll: fan out, claim and spawn. Returns the number of deliveries
    /// dispatched.
    pub async fn tick(&self, semaphore: &Arc<Semaphore>) -> usize {
        if let Err(e) = self
            .tracker
            .fan_out_pending(self.config.fan_out_batch_size)
            .await
        {
            tracing::error!(error = %e, "Fan-out sweep failed");
        }

        let free = semaphore.available_permits();
        if free == 0 {
            tracing::trace!("All dispatch slots occupied");
            return 0;
        }

        let limit = u32::try_from(free).unwrap_or(u32::MAX);
        let claimed = match self
            .tracker
            .claim_due(limit, self.config.claim_grace_seconds)
            .await
        {
            Ok(claimed) => claimed,
            Err(e) => {
                tracing::error!(error = %e, "Failed to claim due deliveries");
                return 0;
            }
        };

        let mut dispatched = 0;
        for claim in claimed {
            let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                tracing::warn!(
                    delivery_id = %claim.delivery.id,
                    "No free slot for claimed delivery; it will be retried after the claim expires"
                );
                continue;
            };
            self.spawn_dispatch(claim, permit);
            dispatched += 1;
        }
        dispatched
    }

    /// Wait until every dispatch slot is free, up to `timeout`. Returns
    /// whether all dispatches finished.
    pub async fn drain(&self, semaphore: &Arc<Semaphore>, timeout: Duration) -> bool {
        let all = u32::try_from(self.slots()).unwrap_or(u32::MAX);
        matches!(
            time::timeout(timeout, semaphore.acquire_many(all)).await,
            Ok(Ok(_))
        )
    }

    /// Semaphore sized for this worker.
    pub fn semaphore(&self) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(self.slots()))
    }

    fn slots(&self) -> usize {
        self.config.concurrency.max(1)
    }

    fn spawn_dispatch(&self, claim: ClaimedDelivery, permit: OwnedSemaphorePermit) {
        let tracker = Arc::clone(&self.tracker);
        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            let _permit = permit;
            let delivery_id = claim.delivery.id;
            tracing::debug!(
                delivery_id = %delivery_id,
                endpoint_id = %claim.endpoint.id,
                event_type = %claim.event.event_type,
                attempt = claim.delivery.attempt_count + 1,
                "Dispatching delivery"
            );

            let outcome = sender.send(&claim).await;
            if let Err(e) = tracker.record_attempt(delivery_id, &outcome).await {
                tracing::error!(
                    delivery_id = %delivery_id,
                    error = %e,
                    "Failed to record delivery attempt"
                );
            }
        });
    }
}
