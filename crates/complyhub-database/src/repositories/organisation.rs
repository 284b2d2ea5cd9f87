//! Organisation repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use complyhub_core::error::{AppError, ErrorKind};
use complyhub_core::result::AppResult;
use complyhub_entity::organisation::Organisation;

use crate::store::OrganisationStore;

/// Repository for organisations.
#[derive(Debug, Clone)]
pub struct OrganisationRepository {
    pool: PgPool,
}

impl OrganisationRepository {
    /// Create a new organisation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganisationStore for OrganisationRepository {
    async fn create(&self, name: &str) -> AppResult<Organisation> {
        sqlx::query_as::<_, Organisation>(
            "INSERT INTO organisations (id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create organisation", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Organisation>> {
        sqlx::query_as::<_, Organisation>("SELECT * FROM organisations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find organisation", e))
    }
}
