//! Cron scheduler for periodic maintenance tasks.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use complyhub_core::config::WorkerConfig;
use complyhub_core::error::AppError;
use complyhub_service::IncomingLogService;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Incoming log retention.
    incoming: IncomingLogService,
    /// Schedules and retention settings.
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("purge_schedule", &self.config.purge_schedule)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(incoming: IncomingLogService, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            incoming,
            config,
        })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_incoming_purge().await?;
        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shut the scheduler down.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Purge processed incoming webhooks past retention.
    async fn register_incoming_purge(&self) -> Result<(), AppError> {
        let incoming = self.incoming.clone();
        let retention_days = self.config.incoming_retention_days;
        let schedule = self.config.purge_schedule.as_str();

        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let incoming = incoming.clone();
            Box::pin(async move {
                tracing::debug!("Running incoming webhook purge");
                if let Err(e) = incoming.purge_processed(retention_days).await {
                    tracing::error!(error = %e, "Incoming webhook purge failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid worker.purge_schedule '{schedule}': {e}"
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add incoming purge schedule: {e}"))
        })?;

        tracing::info!(
            schedule,
            retention_days,
            "Registered: incoming_webhook_purge"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use complyhub_auth::RbacEnforcer;
    use complyhub_database::Stores;

    use super::*;

    fn incoming() -> IncomingLogService {
        IncomingLogService::new(Stores::memory().incoming, Arc::new(RbacEnforcer::new()))
    }

    #[tokio::test]
    async fn test_default_schedule_registers() {
        let scheduler = CronScheduler::new(incoming(), WorkerConfig::default())
            .await
            .unwrap();
        scheduler.register_default_tasks().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_schedule_is_configuration_error() {
        let config = WorkerConfig {
            purge_schedule: "every day please".into(),
            ..WorkerConfig::default()
        };
        let scheduler = CronScheduler::new(incoming(), config).await.unwrap();
        let err = scheduler.register_default_tasks().await.unwrap_err();
        assert!(err.is(complyhub_core::ErrorKind::Configuration));
    }
}
