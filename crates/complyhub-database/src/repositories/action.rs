//! Remedial action repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use complyhub_core::error::{AppError, ErrorKind};
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::action::{ActionStatus, CreateRemedialAction, RemedialAction};

use super::page_bounds;
use crate::store::{ActionFilter, ActionStore};

/// Repository for remedial actions.
#[derive(Debug, Clone)]
pub struct ActionRepository {
    pool: PgPool,
}

impl ActionRepository {
    /// Create a new action repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActionStore for ActionRepository {
    async fn create(&self, data: &CreateRemedialAction) -> AppResult<RemedialAction> {
        sqlx::query_as::<_, RemedialAction>(
            "INSERT INTO remedial_actions \
             (id, organisation_id, property_id, certificate_id, title, description, severity, due_date, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.organisation_id)
        .bind(data.property_id)
        .bind(data.certificate_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.severity)
        .bind(data.due_date)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create action", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RemedialAction>> {
        sqlx::query_as::<_, RemedialAction>("SELECT * FROM remedial_actions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find action", e))
    }

    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &ActionFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<RemedialAction>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM remedial_actions WHERE organisation_id = $1 \
             AND ($2::action_status IS NULL OR status = $2) \
             AND ($3::uuid IS NULL OR property_id = $3)",
        )
        .bind(organisation_id)
        .bind(filter.status)
        .bind(filter.property_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count actions", e))?;

        let (limit, offset) = page_bounds(page);
        let items = sqlx::query_as::<_, RemedialAction>(
            "SELECT * FROM remedial_actions WHERE organisation_id = $1 \
             AND ($2::action_status IS NULL OR status = $2) \
             AND ($3::uuid IS NULL OR property_id = $3) \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5",
        )
        .bind(organisation_id)
        .bind(filter.status)
        .bind(filter.property_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list actions", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: ActionStatus,
        next: ActionStatus,
    ) -> AppResult<RemedialAction> {
        let updated = sqlx::query_as::<_, RemedialAction>(
            "UPDATE remedial_actions SET status = $3, \
             completed_at = CASE WHEN $3 = 'COMPLETED'::action_status THEN NOW() ELSE NULL END, \
             updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update action status", e))?;

        match updated {
            Some(action) => Ok(action),
            None => match self.find_by_id(id).await? {
                Some(current) => Err(AppError::conflict(format!(
                    "Action {id} changed concurrently (now {})",
                    current.status
                ))),
                None => Err(AppError::not_found(format!("Action {id} not found"))),
            },
        }
    }
}
