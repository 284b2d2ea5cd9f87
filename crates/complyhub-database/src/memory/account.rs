//! Organisations, users and API keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_core::result::AppResult;
use complyhub_entity::api_key::{ApiKey, CreateApiKey};
use complyhub_entity::organisation::Organisation;
use complyhub_entity::user::{CreateUser, User};

use super::MemoryStore;
use crate::store::{ApiKeyStore, OrganisationStore, UserStore};

#[async_trait]
impl OrganisationStore for MemoryStore {
    async fn create(&self, name: &str) -> AppResult<Organisation> {
        let organisation = Organisation {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state
            .organisations
            .insert(organisation.id, organisation.clone());
        Ok(organisation)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Organisation>> {
        Ok(self.state.read().await.organisations.get(&id).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == data.email) {
            return Err(AppError::conflict("Email is already registered"));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            organisation_id: data.organisation_id,
            email: data.email.clone(),
            name: data.name.clone(),
            password_hash: data.password_hash.clone(),
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl ApiKeyStore for MemoryStore {
    async fn create(&self, data: &CreateApiKey) -> AppResult<ApiKey> {
        let mut state = self.state.write().await;
        if state.api_keys.values().any(|k| k.prefix == data.prefix) {
            return Err(AppError::conflict("API key prefix collision"));
        }
        let key = ApiKey {
            id: Uuid::new_v4(),
            organisation_id: data.organisation_id,
            name: data.name.clone(),
            prefix: data.prefix.clone(),
            key_hash: data.key_hash.clone(),
            role: data.role,
            created_by: data.created_by,
            last_used_at: None,
            revoked_at: None,
            created_at: Utc::now(),
        };
        state.api_keys.insert(key.id, key.clone());
        Ok(key)
    }

    async fn find_by_prefix(&self, prefix: &str) -> AppResult<Option<ApiKey>> {
        let state = self.state.read().await;
        Ok(state.api_keys.values().find(|k| k.prefix == prefix).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApiKey>> {
        Ok(self.state.read().await.api_keys.get(&id).cloned())
    }

    async fn list_by_organisation(&self, organisation_id: Uuid) -> AppResult<Vec<ApiKey>> {
        let state = self.state.read().await;
        let mut keys: Vec<ApiKey> = state
            .api_keys
            .values()
            .filter(|k| k.organisation_id == organisation_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn revoke(&self, id: Uuid) -> AppResult<ApiKey> {
        let mut state = self.state.write().await;
        let key = state
            .api_keys
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("API key {id} not found")))?;
        key.revoked_at.get_or_insert_with(Utc::now);
        Ok(key.clone())
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(key) = self.state.write().await.api_keys.get_mut(&id) {
            key.last_used_at = Some(at);
        }
        Ok(())
    }
}
