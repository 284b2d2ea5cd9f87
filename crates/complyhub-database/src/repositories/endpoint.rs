//! Webhook endpoint repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use complyhub_core::error::{AppError, ErrorKind};
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::webhook::{EndpointConfig, EndpointStatus, WebhookEndpoint};

use super::page_bounds;
use crate::store::EndpointStore;

/// Repository for the webhook endpoint registry.
#[derive(Debug, Clone)]
pub struct EndpointRepository {
    pool: PgPool,
}

impl EndpointRepository {
    /// Create a new endpoint repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EndpointStore for EndpointRepository {
    async fn create(
        &self,
        organisation_id: Uuid,
        created_by: Option<Uuid>,
        config: &EndpointConfig,
    ) -> AppResult<WebhookEndpoint> {
        sqlx::query_as::<_, WebhookEndpoint>(
            "INSERT INTO webhook_endpoints \
             (id, organisation_id, name, url, auth_type, auth_value, events, retry_count, timeout_ms, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(&config.name)
        .bind(&config.url)
        .bind(config.auth_type)
        .bind(&config.auth_value)
        .bind(&config.events)
        .bind(config.retry_count)
        .bind(config.timeout_ms)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create webhook endpoint", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookEndpoint>> {
        sqlx::query_as::<_, WebhookEndpoint>("SELECT * FROM webhook_endpoints WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find webhook endpoint", e)
            })
    }

    async fn list_by_organisation(
        &self,
        organisation_id: Uuid,
        status: Option<EndpointStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookEndpoint>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM webhook_endpoints \
             WHERE organisation_id = $1 AND ($2::webhook_endpoint_status IS NULL OR status = $2)",
        )
        .bind(organisation_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count webhook endpoints", e))?;

        let (limit, offset) = page_bounds(page);
        let items = sqlx::query_as::<_, WebhookEndpoint>(
            "SELECT * FROM webhook_endpoints \
             WHERE organisation_id = $1 AND ($2::webhook_endpoint_status IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(organisation_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list webhook endpoints", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn list_subscribed(
        &self,
        organisation_id: Uuid,
        event_type: &str,
    ) -> AppResult<Vec<WebhookEndpoint>> {
        // Wildcard matching happens in Rust so both backends share one matcher.
        let active = sqlx::query_as::<_, WebhookEndpoint>(
            "SELECT * FROM webhook_endpoints \
             WHERE organisation_id = $1 AND status = 'ACTIVE' ORDER BY created_at",
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list active endpoints", e))?;

        Ok(active
            .into_iter()
            .filter(|endpoint| endpoint.accepts(event_type))
            .collect())
    }

    async fn update_config(
        &self,
        id: Uuid,
        config: &EndpointConfig,
    ) -> AppResult<WebhookEndpoint> {
        sqlx::query_as::<_, WebhookEndpoint>(
            "UPDATE webhook_endpoints SET name = $2, url = $3, auth_type = $4, auth_value = $5, \
             events = $6, retry_count = $7, timeout_ms = $8, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&config.name)
        .bind(&config.url)
        .bind(config.auth_type)
        .bind(&config.auth_value)
        .bind(&config.events)
        .bind(config.retry_count)
        .bind(config.timeout_ms)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update webhook endpoint", e))?
        .ok_or_else(|| AppError::not_found(format!("Webhook endpoint {id} not found")))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: EndpointStatus,
        reset_failures: bool,
    ) -> AppResult<WebhookEndpoint> {
        sqlx::query_as::<_, WebhookEndpoint>(
            "UPDATE webhook_endpoints SET status = $2, \
             failure_count = CASE WHEN $3 THEN 0 ELSE failure_count END, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(reset_failures)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to set webhook endpoint status", e)
        })?
        .ok_or_else(|| AppError::not_found(format!("Webhook endpoint {id} not found")))
    }
}
