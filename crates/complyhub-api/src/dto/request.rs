//! Request DTOs with validation.
//!
//! Shape rules run in the extractor; the services re-check everything that
//! depends on stored state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use complyhub_entity::action::{ActionSeverity, ActionStatus};
use complyhub_entity::user::Role;
use complyhub_entity::webhook::WebhookAuthType;
use complyhub_service::action::CreateAction;
use complyhub_service::auth::{CreateApiKeyRequest, SignIn, SignUp};
use complyhub_service::knowledge::KnowledgeInput;
use complyhub_service::webhook::{EndpointPatch, RecordEvent, RegisterEndpoint};

// ── Auth ─────────────────────────────────────────────────────

/// `POST /api/auth/sign-up/email`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    /// Email address.
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    /// Password. Policy checks happen in the auth service.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Name of the new organisation.
    #[serde(default, alias = "organisation_name")]
    pub organisation_name: Option<String>,
}

impl From<SignUpRequest> for SignUp {
    fn from(req: SignUpRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            organisation_name: req.organisation_name,
        }
    }
}

/// `POST /api/auth/sign-in/email`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl From<SignInRequest> for SignIn {
    fn from(req: SignInRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
        }
    }
}

/// `POST /api/api-keys`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateApiKeyBody {
    /// Label.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Role granted to the key.
    pub role: Option<Role>,
}

impl From<CreateApiKeyBody> for CreateApiKeyRequest {
    fn from(req: CreateApiKeyBody) -> Self {
        Self {
            name: req.name,
            role: req.role,
        }
    }
}

// ── Webhooks ─────────────────────────────────────────────────

/// `POST /api/webhooks/endpoints`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterEndpointRequest {
    /// Label.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Destination URL.
    #[validate(url(message = "url must be an absolute URL"))]
    pub url: String,
    /// Outbound auth method.
    #[serde(default = "default_auth_type")]
    pub auth_type: WebhookAuthType,
    /// Credential for `auth_type`.
    pub auth_value: Option<String>,
    /// Subscription patterns.
    #[validate(length(min = 1, message = "events must not be empty"))]
    pub events: Vec<String>,
    /// Attempt budget.
    #[validate(range(min = 0, max = 10))]
    pub retry_count: Option<i32>,
    /// Timeout in milliseconds.
    #[validate(range(min = 1000, max = 120000))]
    pub timeout_ms: Option<i32>,
}

fn default_auth_type() -> WebhookAuthType {
    WebhookAuthType::None
}

impl From<RegisterEndpointRequest> for RegisterEndpoint {
    fn from(req: RegisterEndpointRequest) -> Self {
        Self {
            name: req.name,
            url: req.url,
            auth_type: req.auth_type,
            auth_value: req.auth_value,
            events: req.events,
            retry_count: req.retry_count,
            timeout_ms: req.timeout_ms,
        }
    }
}

/// `PATCH /api/webhooks/endpoints/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEndpointRequest {
    /// New label.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New URL.
    #[validate(url)]
    pub url: Option<String>,
    /// New auth method.
    pub auth_type: Option<WebhookAuthType>,
    /// New credential.
    pub auth_value: Option<String>,
    /// New subscription patterns.
    #[validate(length(min = 1, message = "events must not be empty"))]
    pub events: Option<Vec<String>>,
    /// New attempt budget.
    #[validate(range(min = 0, max = 10))]
    pub retry_count: Option<i32>,
    /// New timeout.
    #[validate(range(min = 1000, max = 120000))]
    pub timeout_ms: Option<i32>,
}

impl From<UpdateEndpointRequest> for EndpointPatch {
    fn from(req: UpdateEndpointRequest) -> Self {
        Self {
            name: req.name,
            url: req.url,
            auth_type: req.auth_type,
            auth_value: req.auth_value,
            events: req.events,
            retry_count: req.retry_count,
            timeout_ms: req.timeout_ms,
        }
    }
}

/// `POST /api/webhooks/events`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordEventRequest {
    /// Dotted event type.
    #[validate(length(min = 1, max = 100))]
    pub event_type: String,
    /// Kind of entity.
    #[validate(length(min = 1, max = 100))]
    pub entity_type: String,
    /// Entity identifier.
    #[validate(length(min = 1))]
    pub entity_id: String,
    /// Event body.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl From<RecordEventRequest> for RecordEvent {
    fn from(req: RecordEventRequest) -> Self {
        Self {
            event_type: req.event_type,
            entity_type: req.entity_type,
            entity_id: req.entity_id,
            payload: req.payload,
        }
    }
}

/// `POST /api/webhooks/incoming/{id}/failed`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MarkFailedRequest {
    /// Why processing failed.
    #[validate(length(min = 1, message = "error_message is required"))]
    pub error_message: String,
}

// ── Actions ──────────────────────────────────────────────────

/// `POST /api/actions`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateActionRequest {
    /// Short description of the work.
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
    /// Longer notes.
    pub description: Option<String>,
    /// Urgency, `ROUTINE` when omitted.
    pub severity: Option<ActionSeverity>,
    /// Affected property.
    pub property_id: Option<Uuid>,
    /// Certificate that raised the action.
    pub certificate_id: Option<Uuid>,
    /// Target completion date.
    pub due_date: Option<NaiveDate>,
}

impl From<CreateActionRequest> for CreateAction {
    fn from(req: CreateActionRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            severity: req.severity.unwrap_or(ActionSeverity::Routine),
            property_id: req.property_id,
            certificate_id: req.certificate_id,
            due_date: req.due_date,
        }
    }
}

/// `PATCH /api/actions/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateActionRequest {
    /// Target kanban column.
    pub status: ActionStatus,
}

// ── Knowledge ────────────────────────────────────────────────

/// `POST /api/knowledge` and `PUT /api/knowledge/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct KnowledgeRequest {
    /// Title.
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub content: String,
    /// Category.
    #[validate(length(max = 100))]
    pub category: Option<String>,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<KnowledgeRequest> for KnowledgeInput {
    fn from(req: KnowledgeRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            category: req.category,
            tags: req.tags,
        }
    }
}
