//! Store traits.
//!
//! Services depend on these traits only. [`crate::repositories`] provides
//! the PostgreSQL implementations and, with the `memory` feature,
//! [`crate::memory::MemoryStore`] implements all of them in process.
//!
//! Conventions: `find_*` returns `Ok(None)` for a missing row; mutations
//! addressed by id fail with `NotFound` for a missing row.

pub mod filter;
pub mod stores;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use async_trait::async_trait;
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::action::{ActionStatus, CreateRemedialAction, RemedialAction};
use complyhub_entity::api_key::{ApiKey, CreateApiKey};
use complyhub_entity::knowledge::{
    CreateKnowledgeArticle, KnowledgeArticle, UpdateKnowledgeArticle,
};
use complyhub_entity::organisation::Organisation;
use complyhub_entity::user::{CreateUser, User};
use complyhub_entity::webhook::{
    AttemptOutcome, CreateIncomingWebhookLog, CreateWebhookEvent, DeliveryStats, DeliveryStatus,
    EndpointConfig, EndpointStatus, IncomingWebhookLog, RetryPolicy, WebhookDelivery,
    WebhookEndpoint, WebhookEvent,
};

pub use filter::{ActionFilter, EventFilter, IncomingFilter, KnowledgeFilter};
pub use stores::Stores;

/// A delivery claimed by a worker, with everything needed to dispatch it.
#[derive(Debug, Clone)]
pub struct ClaimedDelivery {
    /// The claimed row.
    pub delivery: WebhookDelivery,
    /// Its endpoint.
    pub endpoint: WebhookEndpoint,
    /// The event being delivered.
    pub event: WebhookEvent,
}

/// Rows written by a recorded attempt.
#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    /// The updated delivery.
    pub delivery: WebhookDelivery,
    /// The updated endpoint.
    pub endpoint: WebhookEndpoint,
}

/// Organisation persistence.
#[async_trait]
pub trait OrganisationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create an organisation.
    async fn create(&self, name: &str) -> AppResult<Organisation>;

    /// Find an organisation by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Organisation>>;
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create a user. Fails with `Conflict` when the email is taken.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by (lowercase) email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
}

/// API key persistence.
#[async_trait]
pub trait ApiKeyStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new key.
    async fn create(&self, data: &CreateApiKey) -> AppResult<ApiKey>;

    /// Find a key by its public prefix, revoked or not.
    async fn find_by_prefix(&self, prefix: &str) -> AppResult<Option<ApiKey>>;

    /// Find a key by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ApiKey>>;

    /// List an organisation's keys, newest first.
    async fn list_by_organisation(&self, organisation_id: Uuid) -> AppResult<Vec<ApiKey>>;

    /// Revoke a key. Revoking twice keeps the first revocation time.
    async fn revoke(&self, id: Uuid) -> AppResult<ApiKey>;

    /// Record that the key authenticated a request.
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}

/// Webhook endpoint registry persistence.
#[async_trait]
pub trait EndpointStore: Send + Sync + std::fmt::Debug + 'static {
    /// Register a new `ACTIVE` endpoint.
    async fn create(
        &self,
        organisation_id: Uuid,
        created_by: Option<Uuid>,
        config: &EndpointConfig,
    ) -> AppResult<WebhookEndpoint>;

    /// Find an endpoint by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookEndpoint>>;

    /// List an organisation's endpoints, newest first.
    async fn list_by_organisation(
        &self,
        organisation_id: Uuid,
        status: Option<EndpointStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookEndpoint>>;

    /// Active endpoints of an organisation whose subscriptions match
    /// `event_type`.
    async fn list_subscribed(
        &self,
        organisation_id: Uuid,
        event_type: &str,
    ) -> AppResult<Vec<WebhookEndpoint>>;

    /// Replace the operator-editable fields.
    async fn update_config(&self, id: Uuid, config: &EndpointConfig)
    -> AppResult<WebhookEndpoint>;

    /// Change status, optionally resetting `failure_count` to zero.
    async fn set_status(
        &self,
        id: Uuid,
        status: EndpointStatus,
        reset_failures: bool,
    ) -> AppResult<WebhookEndpoint>;
}

/// Event log persistence.
#[async_trait]
pub trait EventStore: Send + Sync + std::fmt::Debug + 'static {
    /// Append an event.
    async fn create(&self, data: &CreateWebhookEvent) -> AppResult<WebhookEvent>;

    /// Find an event by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookEvent>>;

    /// List an organisation's events, newest first.
    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookEvent>>;

    /// Oldest unprocessed events across all organisations.
    async fn list_unprocessed(&self, limit: u32) -> AppResult<Vec<WebhookEvent>>;

    /// Mark processed. Idempotent: the first `processed_at` is kept.
    async fn mark_processed(&self, id: Uuid) -> AppResult<WebhookEvent>;
}

/// Delivery tracker persistence.
#[async_trait]
pub trait DeliveryStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create a `PENDING` delivery unless one already exists for the pair.
    /// Returns `None` when the pair already had a row.
    async fn create_pending(
        &self,
        endpoint_id: Uuid,
        event_id: Uuid,
    ) -> AppResult<Option<WebhookDelivery>>;

    /// Find a delivery by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookDelivery>>;

    /// Deliveries of one event, oldest first.
    async fn list_by_event(
        &self,
        event_id: Uuid,
        status: Option<DeliveryStatus>,
    ) -> AppResult<Vec<WebhookDelivery>>;

    /// Deliveries to one endpoint, newest first.
    async fn list_by_endpoint(
        &self,
        endpoint_id: Uuid,
        status: Option<DeliveryStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookDelivery>>;

    /// Claim up to `limit` due deliveries of active endpoints. A claim lasts
    /// the endpoint timeout plus `grace_seconds`.
    async fn claim_due(&self, limit: u32, grace_seconds: u64) -> AppResult<Vec<ClaimedDelivery>>;

    /// Record one attempt, serialized per delivery row. Fails with
    /// `Conflict` on a terminal delivery.
    async fn record_attempt(
        &self,
        id: Uuid,
        outcome: &AttemptOutcome,
        policy: &RetryPolicy,
    ) -> AppResult<RecordedAttempt>;

    /// Delivery counts per status for an organisation.
    async fn stats(&self, organisation_id: Uuid) -> AppResult<DeliveryStats>;
}

/// Incoming webhook log persistence.
#[async_trait]
pub trait IncomingLogStore: Send + Sync + std::fmt::Debug + 'static {
    /// Append a log entry.
    async fn create(&self, data: &CreateIncomingWebhookLog) -> AppResult<IncomingWebhookLog>;

    /// Find a log entry by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<IncomingWebhookLog>>;

    /// List entries, newest first.
    async fn list(
        &self,
        filter: &IncomingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<IncomingWebhookLog>>;

    /// Mark processed and clear the error. Idempotent.
    async fn mark_processed(&self, id: Uuid) -> AppResult<IncomingWebhookLog>;

    /// Record a processing error. Fails with `Conflict` once processed.
    async fn mark_failed(&self, id: Uuid, error_message: &str) -> AppResult<IncomingWebhookLog>;

    /// Delete entries processed before `before`.
    async fn purge_processed(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Remedial action persistence.
#[async_trait]
pub trait ActionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create an `OPEN` action.
    async fn create(&self, data: &CreateRemedialAction) -> AppResult<RemedialAction>;

    /// Find an action by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RemedialAction>>;

    /// List an organisation's actions, newest first.
    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &ActionFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<RemedialAction>>;

    /// Move from `expected` to `next`. Fails with `Conflict` when the stored
    /// status is no longer `expected`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: ActionStatus,
        next: ActionStatus,
    ) -> AppResult<RemedialAction>;
}

/// Knowledge base persistence.
#[async_trait]
pub trait KnowledgeStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create an article.
    async fn create(&self, data: &CreateKnowledgeArticle) -> AppResult<KnowledgeArticle>;

    /// Find an article by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<KnowledgeArticle>>;

    /// List an organisation's articles, most recently updated first.
    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &KnowledgeFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<KnowledgeArticle>>;

    /// Replace an article's editable fields.
    async fn update(&self, id: Uuid, data: &UpdateKnowledgeArticle) -> AppResult<KnowledgeArticle>;

    /// Delete an article.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}
