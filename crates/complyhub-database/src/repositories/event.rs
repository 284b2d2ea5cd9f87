//! Webhook event repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use complyhub_core::error::{AppError, ErrorKind};
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::webhook::{CreateWebhookEvent, WebhookEvent};

use super::page_bounds;
use crate::store::{EventFilter, EventStore};

/// Repository for the append-only event log.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn create(&self, data: &CreateWebhookEvent) -> AppResult<WebhookEvent> {
        sqlx::query_as::<_, WebhookEvent>(
            "INSERT INTO webhook_events (id, organisation_id, event_type, entity_type, entity_id, payload) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.organisation_id)
        .bind(&data.event_type)
        .bind(&data.entity_type)
        .bind(&data.entity_id)
        .bind(&data.payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record webhook event", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookEvent>> {
        sqlx::query_as::<_, WebhookEvent>("SELECT * FROM webhook_events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find webhook event", e))
    }

    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookEvent>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM webhook_events WHERE organisation_id = $1 \
             AND ($2::text IS NULL OR event_type = $2) \
             AND ($3::boolean IS NULL OR processed = $3)",
        )
        .bind(organisation_id)
        .bind(&filter.event_type)
        .bind(filter.processed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count webhook events", e))?;

        let (limit, offset) = page_bounds(page);
        let items = sqlx::query_as::<_, WebhookEvent>(
            "SELECT * FROM webhook_events WHERE organisation_id = $1 \
             AND ($2::text IS NULL OR event_type = $2) \
             AND ($3::boolean IS NULL OR processed = $3) \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        )
        .bind(organisation_id)
        .bind(&filter.event_type)
        .bind(filter.processed)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list webhook events", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn list_unprocessed(&self, limit: u32) -> AppResult<Vec<WebhookEvent>> {
        sqlx::query_as::<_, WebhookEvent>(
            "SELECT * FROM webhook_events WHERE processed = FALSE ORDER BY created_at ASC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list unprocessed events", e)
        })
    }

    async fn mark_processed(&self, id: Uuid) -> AppResult<WebhookEvent> {
        sqlx::query_as::<_, WebhookEvent>(
            "UPDATE webhook_events SET processed = TRUE, processed_at = COALESCE(processed_at, NOW()) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark event processed", e))?
        .ok_or_else(|| AppError::not_found(format!("Webhook event {id} not found")))
    }
}
