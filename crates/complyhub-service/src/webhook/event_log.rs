//! Append-only domain event log.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use complyhub_auth::{Capability, RbacEnforcer};
use complyhub_core::AppError;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_database::store::{EventFilter, EventStore};
use complyhub_entity::webhook::{CreateWebhookEvent, WebhookEvent};

use crate::context::RequestContext;

/// Maximum length of an event or entity type.
const MAX_TYPE_LEN: usize = 100;

/// A manually recorded event.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEvent {
    /// Dotted event type, e.g. `certificate.expired`.
    pub event_type: String,
    /// Kind of entity the event is about.
    pub entity_type: String,
    /// Identifier of that entity.
    pub entity_id: String,
    /// Event body.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Records and inspects domain events. Recording never triggers delivery;
/// the delivery tracker fans events out.
#[derive(Debug, Clone)]
pub struct EventLog {
    /// Event store.
    events: Arc<dyn EventStore>,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
}

impl EventLog {
    /// Creates a new event log.
    pub fn new(events: Arc<dyn EventStore>, rbac: Arc<RbacEnforcer>) -> Self {
        Self { events, rbac }
    }

    /// Record an event for the caller's organisation.
    pub async fn record(
        &self,
        ctx: &RequestContext,
        req: RecordEvent,
    ) -> Result<WebhookEvent, AppError> {
        self.rbac.require(ctx.role, Capability::ManageWebhooks)?;
        self.append(CreateWebhookEvent {
            organisation_id: ctx.organisation_id,
            event_type: req.event_type,
            entity_type: req.entity_type,
            entity_id: req.entity_id,
            payload: req.payload,
        })
        .await
    }

    /// Append an event on behalf of another service. No capability check.
    pub async fn append(&self, mut data: CreateWebhookEvent) -> Result<WebhookEvent, AppError> {
        data.event_type = data.event_type.trim().to_string();
        data.entity_type = data.entity_type.trim().to_string();
        validate_type("event_type", &data.event_type)?;
        validate_type("entity_type", &data.entity_type)?;
        if data.entity_id.trim().is_empty() {
            return Err(AppError::validation("entity_id must not be empty"));
        }

        let event = self.events.create(&data).await?;
        debug!(
            event_id = %event.id,
            organisation_id = %event.organisation_id,
            event_type = %event.event_type,
            "Event recorded"
        );
        Ok(event)
    }

    /// Get an event of the caller's organisation.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<WebhookEvent, AppError> {
        self.rbac.require(ctx.role, Capability::ViewWebhooks)?;
        self.events
            .find_by_id(id)
            .await?
            .filter(|e| ctx.owns(e.organisation_id))
            .ok_or_else(|| AppError::not_found(format!("Event {id} not found")))
    }

    /// List the caller's events, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<WebhookEvent>, AppError> {
        self.rbac.require(ctx.role, Capability::ViewWebhooks)?;
        self.events.list(ctx.organisation_id, filter, page).await
    }

    /// Mark an event processed. Idempotent.
    pub async fn mark_processed(&self, id: Uuid) -> Result<WebhookEvent, AppError> {
        self.events.mark_processed(id).await
    }
}

fn validate_type(field: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() || value.len() > MAX_TYPE_LEN {
        return Err(AppError::validation(format!(
            "{field} must be 1 to {MAX_TYPE_LEN} characters"
        )));
    }
    if value.contains('*') || value.chars().any(char::is_whitespace) {
        return Err(AppError::validation(format!(
            "{field} must not contain wildcards or whitespace"
        )));
    }
    Ok(())
}
