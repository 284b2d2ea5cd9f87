//! Knowledge base articles.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use complyhub_auth::{Capability, RbacEnforcer};
use complyhub_core::AppError;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_database::store::{KnowledgeFilter, KnowledgeStore};
use complyhub_entity::knowledge::{
    CreateKnowledgeArticle, KnowledgeArticle, UpdateKnowledgeArticle,
};
use complyhub_entity::webhook::CreateWebhookEvent;
use complyhub_entity::webhook::event_type::{
    ENTITY_KNOWLEDGE, KNOWLEDGE_CREATED, KNOWLEDGE_DELETED, KNOWLEDGE_UPDATED,
};

use crate::context::RequestContext;
use crate::webhook::EventLog;

const MAX_TITLE_LEN: usize = 255;
const DEFAULT_CATEGORY: &str = "general";

/// Article fields supplied on create and on full update.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeInput {
    /// Title.
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub content: String,
    /// Category, `general` when omitted.
    pub category: Option<String>,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl KnowledgeInput {
    fn normalize(self) -> Result<UpdateKnowledgeArticle, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.len() > MAX_TITLE_LEN {
            return Err(AppError::validation(format!(
                "title must be 1 to {MAX_TITLE_LEN} characters"
            )));
        }
        let category = self
            .category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Ok(UpdateKnowledgeArticle {
            title,
            content: self.content,
            category,
            tags,
        })
    }
}

/// CRUD over an organisation's knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeService {
    /// Article store.
    articles: Arc<dyn KnowledgeStore>,
    /// Event log for `knowledge.*` events.
    events: EventLog,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
}

impl KnowledgeService {
    /// Creates a new knowledge service.
    pub fn new(
        articles: Arc<dyn KnowledgeStore>,
        events: EventLog,
        rbac: Arc<RbacEnforcer>,
    ) -> Self {
        Self {
            articles,
            events,
            rbac,
        }
    }

    /// Publish an article.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: KnowledgeInput,
    ) -> Result<KnowledgeArticle, AppError> {
        self.rbac.require(ctx.role, Capability::ManageKnowledge)?;
        let fields = input.normalize()?;
        let article = self
            .articles
            .create(&CreateKnowledgeArticle {
                organisation_id: ctx.organisation_id,
                title: fields.title,
                content: fields.content,
                category: fields.category,
                tags: fields.tags,
                created_by: ctx.user_id,
            })
            .await?;

        info!(article_id = %article.id, category = %article.category, "Knowledge article created");
        self.emit(&article, KNOWLEDGE_CREATED).await;
        Ok(article)
    }

    /// Get an article.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<KnowledgeArticle, AppError> {
        self.rbac.require(ctx.role, Capability::ViewKnowledge)?;
        self.load(ctx, id).await
    }

    /// List articles, optionally by category and free-text query.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: &KnowledgeFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<KnowledgeArticle>, AppError> {
        self.rbac.require(ctx.role, Capability::ViewKnowledge)?;
        let filter = KnowledgeFilter {
            category: filter
                .category
                .as_ref()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
            q: filter
                .q
                .as_ref()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
        };
        self.articles.list(ctx.organisation_id, &filter, page).await
    }

    /// Replace an article's fields.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        input: KnowledgeInput,
    ) -> Result<KnowledgeArticle, AppError> {
        self.rbac.require(ctx.role, Capability::ManageKnowledge)?;
        self.load(ctx, id).await?;
        let article = self.articles.update(id, &input.normalize()?).await?;
        info!(article_id = %id, "Knowledge article updated");
        self.emit(&article, KNOWLEDGE_UPDATED).await;
        Ok(article)
    }

    /// Delete an article.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), AppError> {
        self.rbac.require(ctx.role, Capability::ManageKnowledge)?;
        let article = self.load(ctx, id).await?;
        self.articles.delete(id).await?;
        info!(article_id = %id, "Knowledge article deleted");
        self.emit(&article, KNOWLEDGE_DELETED).await;
        Ok(())
    }

    async fn load(&self, ctx: &RequestContext, id: Uuid) -> Result<KnowledgeArticle, AppError> {
        self.articles
            .find_by_id(id)
            .await?
            .filter(|a| ctx.owns(a.organisation_id))
            .ok_or_else(|| AppError::not_found(format!("Knowledge article {id} not found")))
    }

    async fn emit(&self, article: &KnowledgeArticle, event_type: &str) {
        let payload = json!({
            "id": article.id,
            "title": article.title,
            "category": article.category,
            "tags": article.tags,
        });
        let result = self
            .events
            .append(CreateWebhookEvent {
                organisation_id: article.organisation_id,
                event_type: event_type.to_string(),
                entity_type: ENTITY_KNOWLEDGE.to_string(),
                entity_id: article.id.to_string(),
                payload,
            })
            .await;
        if let Err(e) = result {
            error!(article_id = %article.id, event_type, error = %e, "Failed to record knowledge event");
        }
    }
}

#[cfg(test)]
mod tests {
    use complyhub_core::ErrorKind;
    use complyhub_database::Stores;
    use complyhub_entity::user::Role;

    use super::*;
    use crate::testing::{ctx, rbac};

    fn service() -> KnowledgeService {
        let stores = Stores::memory();
        let events = EventLog::new(stores.events.clone(), rbac());
        KnowledgeService::new(stores.knowledge, events, rbac())
    }

    fn gas_guide() -> KnowledgeInput {
        KnowledgeInput {
            title: "Gas safety checks".into(),
            content: "Every appliance is checked annually.".into(),
            category: Some(" Gas ".into()),
            tags: vec!["CP12".into(), "cp12".into(), " landlord ".into()],
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_fields() {
        let svc = service();
        let article = svc.create(&ctx(Role::Manager), gas_guide()).await.unwrap();
        assert_eq!(article.category, "gas");
        assert_eq!(article.tags, vec!["cp12", "landlord"]);
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let svc = service();
        let manager = ctx(Role::Manager);
        let article = svc.create(&manager, gas_guide()).await.unwrap();

        let found = svc
            .list(
                &manager,
                &KnowledgeFilter {
                    category: None,
                    q: Some("landlord".into()),
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(found.total_items, 1);

        let mut input = gas_guide();
        input.title = "Gas safety record".into();
        let updated = svc.update(&manager, article.id, input).await.unwrap();
        assert_eq!(updated.title, "Gas safety record");

        svc.delete(&manager, article.id).await.unwrap();
        let err = svc.get(&manager, article.id).await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_officer_can_read_but_not_write() {
        let svc = service();
        let officer = ctx(Role::Officer);
        let err = svc.create(&officer, gas_guide()).await.unwrap_err();
        assert!(err.is(ErrorKind::Authorization));
        let page = svc
            .list(&officer, &KnowledgeFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_items, 0);
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let svc = service();
        let mut input = gas_guide();
        input.title = String::new();
        let err = svc.create(&ctx(Role::Admin), input).await.unwrap_err();
        assert!(err.is(ErrorKind::Validation));
    }
}
