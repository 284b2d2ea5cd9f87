//! Knowledge article repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use complyhub_core::error::{AppError, ErrorKind};
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::knowledge::{
    CreateKnowledgeArticle, KnowledgeArticle, UpdateKnowledgeArticle,
};

use super::page_bounds;
use crate::store::{KnowledgeFilter, KnowledgeStore};

const FILTER: &str = "organisation_id = $1 \
    AND ($2::text IS NULL OR category = $2) \
    AND ($3::text IS NULL OR title ILIKE '%' || $3 || '%' OR content ILIKE '%' || $3 || '%' \
         OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE '%' || $3 || '%'))";

/// Repository for knowledge articles.
#[derive(Debug, Clone)]
pub struct KnowledgeRepository {
    pool: PgPool,
}

impl KnowledgeRepository {
    /// Create a new knowledge repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KnowledgeStore for KnowledgeRepository {
    async fn create(&self, data: &CreateKnowledgeArticle) -> AppResult<KnowledgeArticle> {
        sqlx::query_as::<_, KnowledgeArticle>(
            "INSERT INTO knowledge_articles (id, organisation_id, title, content, category, tags, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.organisation_id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(&data.category)
        .bind(&data.tags)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create article", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<KnowledgeArticle>> {
        sqlx::query_as::<_, KnowledgeArticle>("SELECT * FROM knowledge_articles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find article", e))
    }

    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &KnowledgeFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<KnowledgeArticle>> {
        let query = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM knowledge_articles WHERE {FILTER}"))
                .bind(organisation_id)
                .bind(&filter.category)
                .bind(query)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count articles", e)
                })?;

        let (limit, offset) = page_bounds(page);
        let items = sqlx::query_as::<_, KnowledgeArticle>(&format!(
            "SELECT * FROM knowledge_articles WHERE {FILTER} \
             ORDER BY updated_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(organisation_id)
        .bind(&filter.category)
        .bind(query)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list articles", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn update(&self, id: Uuid, data: &UpdateKnowledgeArticle) -> AppResult<KnowledgeArticle> {
        sqlx::query_as::<_, KnowledgeArticle>(
            "UPDATE knowledge_articles SET title = $2, content = $3, category = $4, tags = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(&data.category)
        .bind(&data.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update article", e))?
        .ok_or_else(|| AppError::not_found(format!("Article {id} not found")))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM knowledge_articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete article", e))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Article {id} not found")));
        }
        Ok(())
    }
}
