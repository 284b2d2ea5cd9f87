//! API key repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use complyhub_core::error::{AppError, ErrorKind};
use complyhub_core::result::AppResult;
use complyhub_entity::api_key::{ApiKey, CreateApiKey};

use super::map_insert_error;
use crate::store::ApiKeyStore;

/// Repository for API keys.
#[derive(Debug, Clone)]
pub struct ApiKeyRepository {
    pool: PgPool,
}

impl ApiKeyRepository {
    /// Create a new API key repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyStore for ApiKeyRepository {
    async fn create(&self, data: &CreateApiKey) -> AppResult<ApiKey> {
        sqlx::query_as::<_, ApiKey>(
            "INSERT INTO api_keys (id, organisation_id, name, prefix, key_hash, role, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.organisation_id)
        .bind(&data.name)
        .bind(&data.prefix)
        .bind(&data.key_hash)
        .bind(data.role)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "API key prefix collision", "Failed to create API key"))
    }

    async fn find_by_prefix(&self, prefix: &str) -> AppResult<Option<ApiKey>> {
        sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE prefix = $1")
            .bind(prefix)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find API key", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApiKey>> {
        sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find API key", e))
    }

    async fn list_by_organisation(&self, organisation_id: Uuid) -> AppResult<Vec<ApiKey>> {
        sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE organisation_id = $1 ORDER BY created_at DESC",
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list API keys", e))
    }

    async fn revoke(&self, id: Uuid) -> AppResult<ApiKey> {
        sqlx::query_as::<_, ApiKey>(
            "UPDATE api_keys SET revoked_at = COALESCE(revoked_at, NOW()) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke API key", e))?
        .ok_or_else(|| AppError::not_found(format!("API key {id} not found")))
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch API key", e))?;
        Ok(())
    }
}
