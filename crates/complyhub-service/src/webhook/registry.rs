//! Webhook endpoint registry.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::ValidateUrl;

use complyhub_auth::{Capability, RbacEnforcer};
use complyhub_core::AppError;
use complyhub_core::config::WebhookConfig;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_database::store::EndpointStore;
use complyhub_entity::webhook::subscription;
use complyhub_entity::webhook::{EndpointConfig, EndpointStatus, WebhookAuthType, WebhookEndpoint};

use crate::context::RequestContext;

/// Allowed range for `retry_count`.
pub const RETRY_COUNT_RANGE: std::ops::RangeInclusive<i32> = 0..=10;
/// Allowed range for `timeout_ms`.
pub const TIMEOUT_MS_RANGE: std::ops::RangeInclusive<i32> = 1_000..=120_000;
/// Maximum endpoint name length.
const MAX_NAME_LEN: usize = 255;

/// Registration request. Omitted retry and timeout fall back to the
/// `[webhooks]` defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterEndpoint {
    /// Label.
    pub name: String,
    /// Absolute http(s) URL.
    pub url: String,
    /// Auth method.
    #[serde(default = "default_auth_type")]
    pub auth_type: WebhookAuthType,
    /// Credential for `auth_type`.
    pub auth_value: Option<String>,
    /// Subscription patterns.
    pub events: Vec<String>,
    /// Attempt budget.
    pub retry_count: Option<i32>,
    /// Timeout in milliseconds.
    pub timeout_ms: Option<i32>,
}

fn default_auth_type() -> WebhookAuthType {
    WebhookAuthType::None
}

/// Partial update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointPatch {
    /// New label.
    pub name: Option<String>,
    /// New URL.
    pub url: Option<String>,
    /// New auth method. Switching to `NONE` clears the credential.
    pub auth_type: Option<WebhookAuthType>,
    /// New credential.
    pub auth_value: Option<String>,
    /// New subscription patterns.
    pub events: Option<Vec<String>>,
    /// New attempt budget.
    pub retry_count: Option<i32>,
    /// New timeout.
    pub timeout_ms: Option<i32>,
}

/// Registers and manages an organisation's webhook endpoints.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    /// Endpoint store.
    endpoints: Arc<dyn EndpointStore>,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
    /// Defaults for omitted fields.
    defaults: WebhookConfig,
}

impl EndpointRegistry {
    /// Creates a new endpoint registry.
    pub fn new(
        endpoints: Arc<dyn EndpointStore>,
        rbac: Arc<RbacEnforcer>,
        defaults: WebhookConfig,
    ) -> Self {
        Self {
            endpoints,
            rbac,
            defaults,
        }
    }

    /// Register a new `ACTIVE` endpoint for the caller's organisation.
    pub async fn register(
        &self,
        ctx: &RequestContext,
        req: RegisterEndpoint,
    ) -> Result<WebhookEndpoint, AppError> {
        self.rbac.require(ctx.role, Capability::ManageWebhooks)?;

        let config = validate_config(EndpointConfig {
            name: req.name,
            url: req.url,
            auth_type: req.auth_type,
            auth_value: req.auth_value,
            events: req.events,
            retry_count: req.retry_count.unwrap_or(self.defaults.default_retry_count),
            timeout_ms: req.timeout_ms.unwrap_or(self.defaults.default_timeout_ms),
        })?;

        let endpoint = self
            .endpoints
            .create(ctx.organisation_id, Some(ctx.user_id), &config)
            .await?;

        info!(
            endpoint_id = %endpoint.id,
            organisation_id = %endpoint.organisation_id,
            url = %endpoint.url,
            events = ?endpoint.events,
            "Webhook endpoint registered"
        );
        Ok(endpoint)
    }

    /// Get an endpoint of the caller's organisation.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<WebhookEndpoint, AppError> {
        self.rbac.require(ctx.role, Capability::ViewWebhooks)?;
        self.load(ctx, id).await
    }

    /// List the caller's endpoints.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        status: Option<EndpointStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<WebhookEndpoint>, AppError> {
        self.rbac.require(ctx.role, Capability::ViewWebhooks)?;
        self.endpoints
            .list_by_organisation(ctx.organisation_id, status, page)
            .await
    }

    /// Apply a patch with the same validation as registration.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        patch: EndpointPatch,
    ) -> Result<WebhookEndpoint, AppError> {
        self.rbac.require(ctx.role, Capability::ManageWebhooks)?;
        let current = self.load(ctx, id).await?;
        if current.status == EndpointStatus::Disabled {
            return Err(AppError::conflict("Endpoint is disabled"));
        }

        let config = validate_config(apply_patch(current.config(), patch))?;
        if config == current.config() {
            return Ok(current);
        }

        let updated = self.endpoints.update_config(id, &config).await?;
        info!(endpoint_id = %id, "Webhook endpoint updated");
        Ok(updated)
    }

    /// Pause deliveries. Allowed from `ACTIVE`, `PAUSED` and `FAILED`.
    pub async fn suspend(&self, ctx: &RequestContext, id: Uuid) -> Result<WebhookEndpoint, AppError> {
        self.rbac.require(ctx.role, Capability::ManageWebhooks)?;
        let current = self.load(ctx, id).await?;
        if !current.status.can_suspend() {
            return Err(AppError::conflict(format!(
                "Cannot suspend an endpoint in status {}",
                current.status
            )));
        }
        let updated = self
            .endpoints
            .set_status(id, EndpointStatus::Paused, false)
            .await?;
        info!(endpoint_id = %id, from = %current.status, "Webhook endpoint suspended");
        Ok(updated)
    }

    /// Reactivate and reset the failure count. Not allowed once disabled.
    pub async fn resume(&self, ctx: &RequestContext, id: Uuid) -> Result<WebhookEndpoint, AppError> {
        self.rbac.require(ctx.role, Capability::ManageWebhooks)?;
        let current = self.load(ctx, id).await?;
        if !current.status.can_resume() {
            return Err(AppError::conflict("Cannot resume a disabled endpoint"));
        }
        let updated = self
            .endpoints
            .set_status(id, EndpointStatus::Active, true)
            .await?;
        info!(
            endpoint_id = %id,
            from = %current.status,
            previous_failures = current.failure_count,
            "Webhook endpoint resumed"
        );
        Ok(updated)
    }

    /// Permanently disable. History is kept; disabling twice is a no-op.
    pub async fn disable(&self, ctx: &RequestContext, id: Uuid) -> Result<WebhookEndpoint, AppError> {
        self.rbac.require(ctx.role, Capability::ManageWebhooks)?;
        let current = self.load(ctx, id).await?;
        if current.status == EndpointStatus::Disabled {
            return Ok(current);
        }
        let updated = self
            .endpoints
            .set_status(id, EndpointStatus::Disabled, false)
            .await?;
        info!(endpoint_id = %id, "Webhook endpoint disabled");
        Ok(updated)
    }

    async fn load(&self, ctx: &RequestContext, id: Uuid) -> Result<WebhookEndpoint, AppError> {
        self.endpoints
            .find_by_id(id)
            .await?
            .filter(|e| ctx.owns(e.organisation_id))
            .ok_or_else(|| AppError::not_found(format!("Webhook endpoint {id} not found")))
    }
}

fn apply_patch(mut config: EndpointConfig, patch: EndpointPatch) -> EndpointConfig {
    if let Some(name) = patch.name {
        config.name = name;
    }
    if let Some(url) = patch.url {
        config.url = url;
    }
    if let Some(auth_type) = patch.auth_type {
        if auth_type != config.auth_type {
            config.auth_value = None;
        }
        config.auth_type = auth_type;
    }
    if patch.auth_value.is_some() {
        config.auth_value = patch.auth_value;
    }
    if let Some(events) = patch.events {
        config.events = events;
    }
    if let Some(retry_count) = patch.retry_count {
        config.retry_count = retry_count;
    }
    if let Some(timeout_ms) = patch.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config
}

/// Normalize and validate an endpoint configuration.
pub fn validate_config(mut config: EndpointConfig) -> Result<EndpointConfig, AppError> {
    config.name = config.name.trim().to_string();
    if config.name.is_empty() || config.name.len() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }

    config.url = config.url.trim().to_string();
    if !is_http_url(&config.url) {
        return Err(AppError::validation("url must be an absolute http or https URL"));
    }

    config.events = subscription::normalize_patterns(&config.events);
    if config.events.is_empty() {
        return Err(AppError::validation("events must not be empty"));
    }
    if let Some(bad) = config
        .events
        .iter()
        .find(|p| !subscription::is_valid_pattern(p))
    {
        return Err(AppError::validation(format!("Invalid event pattern '{bad}'")));
    }

    config.auth_value = match config.auth_type {
        WebhookAuthType::None => None,
        _ => config.auth_value.filter(|v| !v.trim().is_empty()),
    };
    if config.auth_type.requires_value() && config.auth_value.is_none() {
        return Err(AppError::validation(format!(
            "auth_value is required for auth_type {}",
            config.auth_type
        )));
    }

    if !RETRY_COUNT_RANGE.contains(&config.retry_count) {
        return Err(AppError::validation(format!(
            "retry_count must be between {} and {}",
            RETRY_COUNT_RANGE.start(),
            RETRY_COUNT_RANGE.end()
        )));
    }
    if !TIMEOUT_MS_RANGE.contains(&config.timeout_ms) {
        return Err(AppError::validation(format!(
            "timeout_ms must be between {} and {}",
            TIMEOUT_MS_RANGE.start(),
            TIMEOUT_MS_RANGE.end()
        )));
    }

    Ok(config)
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")) && url.validate_url()
}
