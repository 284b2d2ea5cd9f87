//! Remedial actions with a forward-only kanban workflow.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use complyhub_auth::{Capability, RbacEnforcer};
use complyhub_core::AppError;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_database::store::{ActionFilter, ActionStore};
use complyhub_entity::action::{
    ActionSeverity, ActionStatus, CreateRemedialAction, RemedialAction,
};
use complyhub_entity::webhook::CreateWebhookEvent;
use complyhub_entity::webhook::event_type::{
    ACTION_CREATED, ACTION_STATUS_CHANGED, ENTITY_ACTION,
};

use crate::context::RequestContext;
use crate::webhook::EventLog;

/// Maximum title length.
const MAX_TITLE_LEN: usize = 255;

/// Request to raise a remedial action.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAction {
    /// Short description of the work.
    pub title: String,
    /// Longer notes.
    pub description: Option<String>,
    /// Urgency.
    #[serde(default = "default_severity")]
    pub severity: ActionSeverity,
    /// Affected property.
    pub property_id: Option<Uuid>,
    /// Certificate that raised the action.
    pub certificate_id: Option<Uuid>,
    /// Target completion date.
    pub due_date: Option<NaiveDate>,
}

fn default_severity() -> ActionSeverity {
    ActionSeverity::Routine
}

/// Creates remedial actions and moves them through the kanban workflow.
#[derive(Debug, Clone)]
pub struct ActionService {
    /// Action store.
    actions: Arc<dyn ActionStore>,
    /// Event log for `action.*` events.
    events: EventLog,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
}

impl ActionService {
    /// Creates a new action service.
    pub fn new(actions: Arc<dyn ActionStore>, events: EventLog, rbac: Arc<RbacEnforcer>) -> Self {
        Self {
            actions,
            events,
            rbac,
        }
    }

    /// Raise an `OPEN` action and record `action.created`.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateAction,
    ) -> Result<RemedialAction, AppError> {
        self.rbac.require(ctx.role, Capability::ManageActions)?;

        let title = req.title.trim().to_string();
        if title.is_empty() || title.len() > MAX_TITLE_LEN {
            return Err(AppError::validation(format!(
                "title must be 1 to {MAX_TITLE_LEN} characters"
            )));
        }

        let action = self
            .actions
            .create(&CreateRemedialAction {
                organisation_id: ctx.organisation_id,
                property_id: req.property_id,
                certificate_id: req.certificate_id,
                title,
                description: req.description.filter(|d| !d.trim().is_empty()),
                severity: req.severity,
                due_date: req.due_date,
                created_by: ctx.user_id,
            })
            .await?;

        info!(
            action_id = %action.id,
            severity = %action.severity,
            "Remedial action created"
        );
        self.emit(&action, ACTION_CREATED, serde_json::to_value(&action)?)
            .await;
        Ok(action)
    }

    /// Get an action of the caller's organisation.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<RemedialAction, AppError> {
        self.rbac.require(ctx.role, Capability::ViewActions)?;
        self.load(ctx, id).await
    }

    /// List the caller's actions.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: &ActionFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<RemedialAction>, AppError> {
        self.rbac.require(ctx.role, Capability::ViewActions)?;
        self.actions.list(ctx.organisation_id, filter, page).await
    }

    /// Move an action to `target`. Only the next forward status or
    /// `CANCELLED` is accepted; asking for the current status is a no-op.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        target: ActionStatus,
    ) -> Result<RemedialAction, AppError> {
        self.rbac.require(ctx.role, Capability::ManageActions)?;
        let current = self.load(ctx, id).await?;
        if current.status == target {
            return Ok(current);
        }
        if !current.status.can_transition_to(target) {
            return Err(AppError::validation(format!(
                "Cannot move action from {} to {}",
                current.status, target
            )));
        }
        self.transition(current, target).await
    }

    /// Move an action to its next forward status.
    pub async fn advance(&self, ctx: &RequestContext, id: Uuid) -> Result<RemedialAction, AppError> {
        self.rbac.require(ctx.role, Capability::ManageActions)?;
        let current = self.load(ctx, id).await?;
        let target = current.status.next().ok_or_else(|| {
            AppError::validation(format!("Action is already {}", current.status))
        })?;
        self.transition(current, target).await
    }

    async fn transition(
        &self,
        current: RemedialAction,
        target: ActionStatus,
    ) -> Result<RemedialAction, AppError> {
        let updated = self
            .actions
            .update_status(current.id, current.status, target)
            .await?;

        info!(
            action_id = %updated.id,
            from = %current.status,
            to = %updated.status,
            "Remedial action status changed"
        );
        let payload = json!({
            "id": updated.id,
            "title": updated.title,
            "property_id": updated.property_id,
            "from": current.status,
            "to": updated.status,
            "completed_at": updated.completed_at,
        });
        self.emit(&updated, ACTION_STATUS_CHANGED, payload).await;
        Ok(updated)
    }

    async fn load(&self, ctx: &RequestContext, id: Uuid) -> Result<RemedialAction, AppError> {
        self.actions
            .find_by_id(id)
            .await?
            .filter(|a| ctx.owns(a.organisation_id))
            .ok_or_else(|| AppError::not_found(format!("Action {id} not found")))
    }

    async fn emit(&self, action: &RemedialAction, event_type: &str, payload: serde_json::Value) {
        let result = self
            .events
            .append(CreateWebhookEvent {
                organisation_id: action.organisation_id,
                event_type: event_type.to_string(),
                entity_type: ENTITY_ACTION.to_string(),
                entity_id: action.id.to_string(),
                payload,
            })
            .await;
        if let Err(e) = result {
            error!(action_id = %action.id, event_type, error = %e, "Failed to record action event");
        }
    }
}
