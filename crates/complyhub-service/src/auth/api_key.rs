//! Organisation API keys.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use complyhub_auth::{Capability, RbacEnforcer, generate_api_key, hash_api_key, parse_api_key};
use complyhub_core::AppError;
use complyhub_database::store::ApiKeyStore;
use complyhub_entity::api_key::{ApiKey, CreateApiKey};
use complyhub_entity::user::Role;

use crate::context::RequestContext;

const MAX_NAME_LEN: usize = 100;

/// Request to create a key.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    /// Label.
    pub name: String,
    /// Role granted to requests using the key. Defaults to `VIEWER`.
    pub role: Option<Role>,
}

/// A new key with its raw value. The raw value is never retrievable again.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedApiKey {
    /// Stored key metadata.
    #[serde(flatten)]
    pub key: ApiKey,
    /// Full raw key.
    pub raw_key: String,
}

/// Creates, lists, revokes and verifies API keys.
#[derive(Debug, Clone)]
pub struct ApiKeyService {
    /// Key store.
    api_keys: Arc<dyn ApiKeyStore>,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
}

impl ApiKeyService {
    /// Creates a new API key service.
    pub fn new(api_keys: Arc<dyn ApiKeyStore>, rbac: Arc<RbacEnforcer>) -> Self {
        Self { api_keys, rbac }
    }

    /// Generate a key for the caller's organisation.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateApiKeyRequest,
    ) -> Result<CreatedApiKey, AppError> {
        self.rbac.require(ctx.role, Capability::ManageApiKeys)?;
        let name = req.name.trim().to_string();
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(AppError::validation(format!(
                "name must be 1 to {MAX_NAME_LEN} characters"
            )));
        }

        let generated = generate_api_key();
        let key = self
            .api_keys
            .create(&CreateApiKey {
                organisation_id: ctx.organisation_id,
                name,
                prefix: generated.prefix,
                key_hash: generated.hash,
                role: req.role.unwrap_or(Role::Viewer),
                created_by: ctx.user_id,
            })
            .await?;

        info!(key_id = %key.id, prefix = %key.prefix, role = %key.role, "API key created");
        Ok(CreatedApiKey {
            key,
            raw_key: generated.raw,
        })
    }

    /// List the caller's organisation keys, including revoked ones.
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<ApiKey>, AppError> {
        self.rbac.require(ctx.role, Capability::ManageApiKeys)?;
        self.api_keys.list_by_organisation(ctx.organisation_id).await
    }

    /// Revoke a key.
    pub async fn revoke(&self, ctx: &RequestContext, id: Uuid) -> Result<ApiKey, AppError> {
        self.rbac.require(ctx.role, Capability::ManageApiKeys)?;
        let owned = self
            .api_keys
            .find_by_id(id)
            .await?
            .is_some_and(|k| ctx.owns(k.organisation_id));
        if !owned {
            return Err(AppError::not_found(format!("API key {id} not found")));
        }
        let key = self.api_keys.revoke(id).await?;
        info!(key_id = %id, "API key revoked");
        Ok(key)
    }

    /// Verify a raw key and build the request context it grants.
    pub async fn authenticate(&self, raw: &str) -> Result<RequestContext, AppError> {
        let invalid = || AppError::authentication("Invalid API key");
        let prefix = parse_api_key(raw).ok_or_else(invalid)?;
        let key = self
            .api_keys
            .find_by_prefix(prefix)
            .await?
            .ok_or_else(invalid)?;

        if key.key_hash != hash_api_key(raw) {
            warn!(prefix = %prefix, "API key hash mismatch");
            return Err(invalid());
        }
        if !key.is_active() {
            return Err(AppError::authentication("API key has been revoked"));
        }

        if let Err(e) = self.api_keys.touch(key.id, Utc::now()).await {
            warn!(key_id = %key.id, error = %e, "Failed to record API key use");
        }

        Ok(RequestContext::for_api_key(
            key.id,
            key.created_by,
            key.organisation_id,
            key.role,
        ))
    }
}
