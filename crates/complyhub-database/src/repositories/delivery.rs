//! Webhook delivery repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use complyhub_core::error::{AppError, ErrorKind};
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::webhook::{
    AttemptOutcome, DeliveryStats, DeliveryStatus, EndpointEffect, RetryPolicy, WebhookDelivery,
    WebhookEndpoint, WebhookEvent, plan_attempt,
};

use super::page_bounds;
use crate::store::{ClaimedDelivery, DeliveryStore, RecordedAttempt};

/// Repository for the delivery tracker.
#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    pool: PgPool,
}

impl DeliveryRepository {
    /// Create a new delivery repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryStore for DeliveryRepository {
    async fn create_pending(
        &self,
        endpoint_id: Uuid,
        event_id: Uuid,
    ) -> AppResult<Option<WebhookDelivery>> {
        sqlx::query_as::<_, WebhookDelivery>(
            "INSERT INTO webhook_deliveries (id, webhook_endpoint_id, event_id) VALUES ($1, $2, $3) \
             ON CONFLICT (webhook_endpoint_id, event_id) DO NOTHING RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(endpoint_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create delivery", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookDelivery>> {
        sqlx::query_as::<_, WebhookDelivery>("SELECT * FROM webhook_deliveries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find delivery", e))
    }

    async fn list_by_event(
        &self,
        event_id: Uuid,
        status: Option<DeliveryStatus>,
    ) -> AppResult<Vec<WebhookDelivery>> {
        sqlx::query_as::<_, WebhookDelivery>(
            "SELECT * FROM webhook_deliveries WHERE event_id = $1 \
             AND ($2::webhook_delivery_status IS NULL OR status = $2) ORDER BY created_at ASC",
        )
        .bind(event_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list deliveries for event", e)
        })
    }

    async fn list_by_endpoint(
        &self,
        endpoint_id: Uuid,
        status: Option<DeliveryStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookDelivery>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM webhook_deliveries WHERE webhook_endpoint_id = $1 \
             AND ($2::webhook_delivery_status IS NULL OR status = $2)",
        )
        .bind(endpoint_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count deliveries", e))?;

        let (limit, offset) = page_bounds(page);
        let items = sqlx::query_as::<_, WebhookDelivery>(
            "SELECT * FROM webhook_deliveries WHERE webhook_endpoint_id = $1 \
             AND ($2::webhook_delivery_status IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(endpoint_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list deliveries for endpoint", e)
        })?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn claim_due(&self, limit: u32, grace_seconds: u64) -> AppResult<Vec<ClaimedDelivery>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let claimed = sqlx::query_as::<_, WebhookDelivery>(
            "WITH due AS ( \
                SELECT d.id FROM webhook_deliveries d \
                JOIN webhook_endpoints e ON e.id = d.webhook_endpoint_id \
                WHERE e.status = 'ACTIVE' \
                AND (d.status = 'PENDING' \
                     OR (d.status = 'RETRYING' AND (d.next_retry_at IS NULL OR d.next_retry_at <= NOW()))) \
                AND (d.claimed_until IS NULL OR d.claimed_until <= NOW()) \
                ORDER BY COALESCE(d.next_retry_at, d.created_at) ASC \
                FOR UPDATE OF d SKIP LOCKED \
                LIMIT $1 \
             ) \
             UPDATE webhook_deliveries d \
             SET claimed_until = NOW() + make_interval(secs => e.timeout_ms / 1000.0 + $2::float8), \
                 updated_at = NOW() \
             FROM due, webhook_endpoints e \
             WHERE d.id = due.id AND e.id = d.webhook_endpoint_id \
             RETURNING d.*",
        )
        .bind(i64::from(limit))
        .bind(grace_seconds as f64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim deliveries", e))?;

        if claimed.is_empty() {
            return Ok(Vec::new());
        }

        let endpoint_ids: Vec<Uuid> = claimed.iter().map(|d| d.webhook_endpoint_id).collect();
        let event_ids: Vec<Uuid> = claimed.iter().map(|d| d.event_id).collect();

        let endpoints: HashMap<Uuid, WebhookEndpoint> = sqlx::query_as::<_, WebhookEndpoint>(
            "SELECT * FROM webhook_endpoints WHERE id = ANY($1)",
        )
        .bind(&endpoint_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load claimed endpoints", e))?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();

        let events: HashMap<Uuid, WebhookEvent> = sqlx::query_as::<_, WebhookEvent>(
            "SELECT * FROM webhook_events WHERE id = ANY($1)",
        )
        .bind(&event_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load claimed events", e))?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();

        let mut jobs = Vec::with_capacity(claimed.len());
        for delivery in claimed {
            let endpoint = endpoints.get(&delivery.webhook_endpoint_id).cloned();
            let event = events.get(&delivery.event_id).cloned();
            match (endpoint, event) {
                (Some(endpoint), Some(event)) => jobs.push(ClaimedDelivery {
                    delivery,
                    endpoint,
                    event,
                }),
                _ => warn!(delivery_id = %delivery.id, "Claimed delivery lost its endpoint or event"),
            }
        }
        Ok(jobs)
    }

    async fn record_attempt(
        &self,
        id: Uuid,
        outcome: &AttemptOutcome,
        policy: &RetryPolicy,
    ) -> AppResult<RecordedAttempt> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let delivery = sqlx::query_as::<_, WebhookDelivery>(
            "SELECT * FROM webhook_deliveries WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock delivery", e))?
        .ok_or_else(|| AppError::not_found(format!("Delivery {id} not found")))?;

        let endpoint = sqlx::query_as::<_, WebhookEndpoint>(
            "SELECT * FROM webhook_endpoints WHERE id = $1 FOR UPDATE",
        )
        .bind(delivery.webhook_endpoint_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock endpoint", e))?;

        let plan = plan_attempt(&delivery, &endpoint, outcome, policy, Utc::now())?;

        let delivery = sqlx::query_as::<_, WebhookDelivery>(
            "UPDATE webhook_deliveries SET status = $2, attempt_count = $3, last_attempt_at = $4, \
             next_retry_at = $5, response_status = $6, response_body = $7, duration_ms = $8, \
             error_message = $9, claimed_until = NULL, updated_at = $4 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(plan.status)
        .bind(plan.attempt_count)
        .bind(plan.last_attempt_at)
        .bind(plan.next_retry_at)
        .bind(plan.response_status)
        .bind(&plan.response_body)
        .bind(plan.duration_ms)
        .bind(&plan.error_message)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record attempt", e))?;

        let endpoint = match plan.endpoint {
            EndpointEffect::Unchanged => endpoint,
            EndpointEffect::Succeeded { at } => sqlx::query_as::<_, WebhookEndpoint>(
                "UPDATE webhook_endpoints SET failure_count = 0, last_success_at = $2, updated_at = $2 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(endpoint.id)
            .bind(at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update endpoint", e))?,
            EndpointEffect::Failed {
                failure_count,
                at,
                status,
            } => sqlx::query_as::<_, WebhookEndpoint>(
                "UPDATE webhook_endpoints SET failure_count = $2, last_failure_at = $3, \
                 status = COALESCE($4, status), updated_at = $3 WHERE id = $1 RETURNING *",
            )
            .bind(endpoint.id)
            .bind(failure_count)
            .bind(at)
            .bind(status)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update endpoint", e))?,
        };

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit attempt", e)
        })?;

        Ok(RecordedAttempt { delivery, endpoint })
    }

    async fn stats(&self, organisation_id: Uuid) -> AppResult<DeliveryStats> {
        let rows: Vec<(DeliveryStatus, i64)> = sqlx::query_as(
            "SELECT d.status, COUNT(*) FROM webhook_deliveries d \
             JOIN webhook_endpoints e ON e.id = d.webhook_endpoint_id \
             WHERE e.organisation_id = $1 GROUP BY d.status",
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to compute delivery stats", e))?;

        let mut stats = DeliveryStats::default();
        for (status, count) in rows {
            stats.add(status, count);
        }
        Ok(stats)
    }
}
