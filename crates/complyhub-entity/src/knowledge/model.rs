//! Knowledge article entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A knowledge base article.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct KnowledgeArticle {
    /// Unique article identifier.
    pub id: Uuid,
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Article title (never empty).
    pub title: String,
    /// Article body (markdown).
    pub content: String,
    /// Free-form category, e.g. `"gas"` or `"fire"`.
    pub category: String,
    /// Search tags.
    pub tags: Vec<String>,
    /// Author.
    pub created_by: Uuid,
    /// When the article was created.
    pub created_at: DateTime<Utc>,
    /// When the article was last updated.
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeArticle {
    /// Case-insensitive match of `query` against title, content and tags.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

/// Data required to create an article.
#[derive(Debug, Clone)]
pub struct CreateKnowledgeArticle {
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Title.
    pub title: String,
    /// Body.
    pub content: String,
    /// Category.
    pub category: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Author.
    pub created_by: Uuid,
}

/// Full replacement of an article's editable fields.
#[derive(Debug, Clone)]
pub struct UpdateKnowledgeArticle {
    /// Title.
    pub title: String,
    /// Body.
    pub content: String,
    /// Category.
    pub category: String,
    /// Tags.
    pub tags: Vec<String>,
}
