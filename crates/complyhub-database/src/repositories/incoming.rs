//! Incoming webhook log repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use complyhub_core::error::{AppError, ErrorKind};
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::webhook::{CreateIncomingWebhookLog, IncomingWebhookLog};

use super::page_bounds;
use crate::store::{IncomingFilter, IncomingLogStore};

/// Repository for the incoming webhook log.
#[derive(Debug, Clone)]
pub struct IncomingLogRepository {
    pool: PgPool,
}

impl IncomingLogRepository {
    /// Create a new incoming log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn require(&self, id: Uuid) -> AppResult<IncomingWebhookLog> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Incoming webhook log {id} not found")))
    }
}

#[async_trait]
impl IncomingLogStore for IncomingLogRepository {
    async fn create(&self, data: &CreateIncomingWebhookLog) -> AppResult<IncomingWebhookLog> {
        sqlx::query_as::<_, IncomingWebhookLog>(
            "INSERT INTO incoming_webhook_logs (id, source, event_type, payload, headers) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.source)
        .bind(&data.event_type)
        .bind(&data.payload)
        .bind(&data.headers)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to log incoming webhook", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<IncomingWebhookLog>> {
        sqlx::query_as::<_, IncomingWebhookLog>("SELECT * FROM incoming_webhook_logs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find incoming webhook log", e)
            })
    }

    async fn list(
        &self,
        filter: &IncomingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<IncomingWebhookLog>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM incoming_webhook_logs \
             WHERE ($1::text IS NULL OR source = $1) AND ($2::boolean IS NULL OR processed = $2)",
        )
        .bind(&filter.source)
        .bind(filter.processed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count incoming logs", e))?;

        let (limit, offset) = page_bounds(page);
        let items = sqlx::query_as::<_, IncomingWebhookLog>(
            "SELECT * FROM incoming_webhook_logs \
             WHERE ($1::text IS NULL OR source = $1) AND ($2::boolean IS NULL OR processed = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(&filter.source)
        .bind(filter.processed)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list incoming logs", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn mark_processed(&self, id: Uuid) -> AppResult<IncomingWebhookLog> {
        sqlx::query_as::<_, IncomingWebhookLog>(
            "UPDATE incoming_webhook_logs SET processed = TRUE, \
             processed_at = COALESCE(processed_at, GREATEST(NOW(), created_at)), error_message = NULL \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark incoming log processed", e))?
        .ok_or_else(|| AppError::not_found(format!("Incoming webhook log {id} not found")))
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> AppResult<IncomingWebhookLog> {
        let updated = sqlx::query_as::<_, IncomingWebhookLog>(
            "UPDATE incoming_webhook_logs SET error_message = $2 \
             WHERE id = $1 AND processed = FALSE RETURNING *",
        )
        .bind(id)
        .bind(error_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark incoming log failed", e))?;

        match updated {
            Some(log) => Ok(log),
            None => {
                self.require(id).await?;
                Err(AppError::conflict(format!(
                    "Incoming webhook log {id} is already processed"
                )))
            }
        }
    }

    async fn purge_processed(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM incoming_webhook_logs WHERE processed = TRUE AND processed_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to purge incoming logs", e))?;
        Ok(result.rows_affected())
    }
}
