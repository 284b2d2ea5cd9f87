//! Remedial actions and knowledge articles.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::action::{ActionStatus, CreateRemedialAction, RemedialAction};
use complyhub_entity::knowledge::{
    CreateKnowledgeArticle, KnowledgeArticle, UpdateKnowledgeArticle,
};

use super::MemoryStore;
use crate::store::{ActionFilter, ActionStore, KnowledgeFilter, KnowledgeStore};

#[async_trait]
impl ActionStore for MemoryStore {
    async fn create(&self, data: &CreateRemedialAction) -> AppResult<RemedialAction> {
        let now = Utc::now();
        let action = RemedialAction {
            id: Uuid::new_v4(),
            organisation_id: data.organisation_id,
            property_id: data.property_id,
            certificate_id: data.certificate_id,
            title: data.title.clone(),
            description: data.description.clone(),
            severity: data.severity,
            status: ActionStatus::Open,
            due_date: data.due_date,
            completed_at: None,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.actions.insert(action.id, action.clone());
        Ok(action)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RemedialAction>> {
        Ok(self.state.read().await.actions.get(&id).cloned())
    }

    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &ActionFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<RemedialAction>> {
        let state = self.state.read().await;
        let mut items: Vec<RemedialAction> = state
            .actions
            .values()
            .filter(|a| a.organisation_id == organisation_id)
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .filter(|a| filter.property_id.is_none_or(|p| a.property_id == Some(p)))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PageResponse::from_slice(items, page))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: ActionStatus,
        next: ActionStatus,
    ) -> AppResult<RemedialAction> {
        let mut state = self.state.write().await;
        let action = state
            .actions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Action {id} not found")))?;
        if action.status != expected {
            return Err(AppError::conflict(format!(
                "Action {id} changed concurrently (now {})",
                action.status
            )));
        }
        let now = Utc::now();
        action.status = next;
        action.completed_at = (next == ActionStatus::Completed).then_some(now);
        action.updated_at = now;
        Ok(action.clone())
    }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn create(&self, data: &CreateKnowledgeArticle) -> AppResult<KnowledgeArticle> {
        let now = Utc::now();
        let article = KnowledgeArticle {
            id: Uuid::new_v4(),
            organisation_id: data.organisation_id,
            title: data.title.clone(),
            content: data.content.clone(),
            category: data.category.clone(),
            tags: data.tags.clone(),
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.knowledge.insert(article.id, article.clone());
        Ok(article)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<KnowledgeArticle>> {
        Ok(self.state.read().await.knowledge.get(&id).cloned())
    }

    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &KnowledgeFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<KnowledgeArticle>> {
        let query = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let state = self.state.read().await;
        let mut items: Vec<KnowledgeArticle> = state
            .knowledge
            .values()
            .filter(|a| a.organisation_id == organisation_id)
            .filter(|a| filter.category.as_ref().is_none_or(|c| &a.category == c))
            .filter(|a| query.is_none_or(|q| a.matches_query(q)))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(PageResponse::from_slice(items, page))
    }

    async fn update(&self, id: Uuid, data: &UpdateKnowledgeArticle) -> AppResult<KnowledgeArticle> {
        let mut state = self.state.write().await;
        let article = state
            .knowledge
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Article {id} not found")))?;
        article.title = data.title.clone();
        article.content = data.content.clone();
        article.category = data.category.clone();
        article.tags = data.tags.clone();
        article.updated_at = Utc::now();
        Ok(article.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .knowledge
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Article {id} not found")))
    }
}
