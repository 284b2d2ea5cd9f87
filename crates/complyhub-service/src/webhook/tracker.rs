//! Delivery tracker: fan-out, attempt bookkeeping and inspection.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use complyhub_auth::{Capability, RbacEnforcer};
use complyhub_core::AppError;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_database::store::{
    ClaimedDelivery, DeliveryStore, EndpointStore, EventStore, RecordedAttempt,
};
use complyhub_entity::webhook::{
    AttemptOutcome, DeliveryStats, DeliveryStatus, EndpointStatus, RetryPolicy, WebhookDelivery,
    WebhookEndpoint, WebhookEvent,
};

use crate::context::RequestContext;

/// Creates deliveries for events and records the outcome of each attempt.
#[derive(Debug, Clone)]
pub struct DeliveryTracker {
    /// Endpoint store.
    endpoints: Arc<dyn EndpointStore>,
    /// Event store.
    events: Arc<dyn EventStore>,
    /// Delivery store.
    deliveries: Arc<dyn DeliveryStore>,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
    /// Backoff and failure threshold.
    policy: RetryPolicy,
}

impl DeliveryTracker {
    /// Creates a new delivery tracker.
    pub fn new(
        endpoints: Arc<dyn EndpointStore>,
        events: Arc<dyn EventStore>,
        deliveries: Arc<dyn DeliveryStore>,
        rbac: Arc<RbacEnforcer>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            endpoints,
            events,
            deliveries,
            rbac,
            policy,
        }
    }

    /// The retry policy in force.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Create one `PENDING` delivery per active subscribed endpoint of the
    /// event's organisation. Returns only the rows this call created.
    pub async fn schedule_deliveries(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<WebhookDelivery>, AppError> {
        let event = self.load_event(event_id).await?;
        self.schedule_for(&event).await
    }

    /// Schedule deliveries and mark the event processed.
    pub async fn fan_out(&self, event_id: Uuid) -> Result<Vec<WebhookDelivery>, AppError> {
        let event = self.load_event(event_id).await?;
        self.fan_out_event(&event).await
    }

    /// Manually fan out one of the caller's events.
    pub async fn fan_out_for(
        &self,
        ctx: &RequestContext,
        event_id: Uuid,
    ) -> Result<Vec<WebhookDelivery>, AppError> {
        self.rbac.require(ctx.role, Capability::ManageWebhooks)?;
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .filter(|e| ctx.owns(e.organisation_id))
            .ok_or_else(|| AppError::not_found(format!("Event {event_id} not found")))?;
        self.fan_out_event(&event).await
    }

    /// Fan out up to `limit` of the oldest unprocessed events. Returns the
    /// number of deliveries created. A failing event is logged and left
    /// unprocessed for the next sweep.
    pub async fn fan_out_pending(&self, limit: u32) -> Result<usize, AppError> {
        let events = self.events.list_unprocessed(limit).await?;
        let mut created = 0;
        for event in &events {
            match self.fan_out_event(event).await {
                Ok(deliveries) => created += deliveries.len(),
                Err(e) => warn!(event_id = %event.id, error = %e, "Event fan-out failed"),
            }
        }
        if !events.is_empty() {
            debug!(events = events.len(), deliveries = created, "Fan-out sweep finished");
        }
        Ok(created)
    }

    /// Claim due deliveries for dispatch.
    pub async fn claim_due(
        &self,
        limit: u32,
        grace_seconds: u64,
    ) -> Result<Vec<ClaimedDelivery>, AppError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.deliveries.claim_due(limit, grace_seconds).await
    }

    /// Record the outcome of one attempt.
    pub async fn record_attempt(
        &self,
        delivery_id: Uuid,
        outcome: &AttemptOutcome,
    ) -> Result<RecordedAttempt, AppError> {
        let before = self
            .deliveries
            .find_by_id(delivery_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Delivery {delivery_id} not found")))?;
        let endpoint_status = self
            .endpoints
            .find_by_id(before.webhook_endpoint_id)
            .await?
            .map(|e| e.status);

        let recorded = self
            .deliveries
            .record_attempt(delivery_id, outcome, &self.policy)
            .await?;
        let delivery = &recorded.delivery;

        match delivery.status {
            DeliveryStatus::Sent => debug!(
                delivery_id = %delivery.id,
                attempt = delivery.attempt_count,
                "Delivery sent"
            ),
            DeliveryStatus::Retrying => debug!(
                delivery_id = %delivery.id,
                attempt = delivery.attempt_count,
                next_retry_at = ?delivery.next_retry_at,
                "Delivery scheduled for retry"
            ),
            _ => warn!(
                delivery_id = %delivery.id,
                endpoint_id = %recorded.endpoint.id,
                attempts = delivery.attempt_count,
                error = ?delivery.error_message,
                "Delivery failed permanently"
            ),
        }

        if endpoint_status == Some(EndpointStatus::Active)
            && recorded.endpoint.status == EndpointStatus::Failed
        {
            warn!(
                endpoint_id = %recorded.endpoint.id,
                failure_count = recorded.endpoint.failure_count,
                "Webhook endpoint reached the failure threshold and was marked FAILED"
            );
        }

        Ok(recorded)
    }

    /// Get a delivery whose endpoint belongs to the caller's organisation.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<WebhookDelivery, AppError> {
        self.rbac.require(ctx.role, Capability::ViewWebhooks)?;
        let delivery = self
            .deliveries
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Delivery {id} not found")))?;
        let owned = self
            .endpoints
            .find_by_id(delivery.webhook_endpoint_id)
            .await?
            .is_some_and(|e| ctx.owns(e.organisation_id));
        if !owned {
            return Err(AppError::not_found(format!("Delivery {id} not found")));
        }
        Ok(delivery)
    }

    /// Deliveries of one of the caller's events.
    pub async fn list_for_event(
        &self,
        ctx: &RequestContext,
        event_id: Uuid,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<WebhookDelivery>, AppError> {
        self.rbac.require(ctx.role, Capability::ViewWebhooks)?;
        let owned = self
            .events
            .find_by_id(event_id)
            .await?
            .is_some_and(|e| ctx.owns(e.organisation_id));
        if !owned {
            return Err(AppError::not_found(format!("Event {event_id} not found")));
        }
        self.deliveries.list_by_event(event_id, status).await
    }

    /// Deliveries to one of the caller's endpoints.
    pub async fn list_for_endpoint(
        &self,
        ctx: &RequestContext,
        endpoint_id: Uuid,
        status: Option<DeliveryStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<WebhookDelivery>, AppError> {
        self.rbac.require(ctx.role, Capability::ViewWebhooks)?;
        let owned = self
            .endpoints
            .find_by_id(endpoint_id)
            .await?
            .is_some_and(|e| ctx.owns(e.organisation_id));
        if !owned {
            return Err(AppError::not_found(format!(
                "Webhook endpoint {endpoint_id} not found"
            )));
        }
        self.deliveries
            .list_by_endpoint(endpoint_id, status, page)
            .await
    }

    /// Delivery counts per status for the caller's organisation.
    pub async fn stats(&self, ctx: &RequestContext) -> Result<DeliveryStats, AppError> {
        self.rbac.require(ctx.role, Capability::ViewWebhooks)?;
        self.deliveries.stats(ctx.organisation_id).await
    }

    async fn load_event(&self, event_id: Uuid) -> Result<WebhookEvent, AppError> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Event {event_id} not found")))
    }

    async fn schedule_for(&self, event: &WebhookEvent) -> Result<Vec<WebhookDelivery>, AppError> {
        let endpoints: Vec<WebhookEndpoint> = self
            .endpoints
            .list_subscribed(event.organisation_id, &event.event_type)
            .await?;

        let mut created = Vec::new();
        for endpoint in &endpoints {
            if let Some(delivery) = self.deliveries.create_pending(endpoint.id, event.id).await? {
                created.push(delivery);
            }
        }
        Ok(created)
    }

    async fn fan_out_event(&self, event: &WebhookEvent) -> Result<Vec<WebhookDelivery>, AppError> {
        let created = self.schedule_for(event).await?;
        self.events.mark_processed(event.id).await?;
        if !created.is_empty() {
            info!(
                event_id = %event.id,
                event_type = %event.event_type,
                deliveries = created.len(),
                "Event fanned out"
            );
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use complyhub_core::ErrorKind;
    use complyhub_entity::user::Role;

    use super::*;
    use crate::testing::{ctx, register, webhooks};
    use crate::webhook::RecordEvent;

    fn failure() -> AttemptOutcome {
        AttemptOutcome::Failure {
            response_status: Some(503),
            response_body: Some("unavailable".into()),
            duration_ms: Some(12),
            error_message: "HTTP 503".into(),
        }
    }

    fn success() -> AttemptOutcome {
        AttemptOutcome::Success {
            response_status: 200,
            response_body: None,
            duration_ms: 8,
        }
    }

    fn action_created() -> RecordEvent {
        RecordEvent {
            event_type: "action.created".into(),
            entity_type: "remedial_action".into(),
            entity_id: Uuid::new_v4().to_string(),
            payload: json!({"title": "Replace smoke alarm"}),
        }
    }

    #[tokio::test]
    async fn test_schedule_twice_creates_no_duplicates() {
        let fx = webhooks(RetryPolicy::default());
        let admin = ctx(Role::Admin);
        fx.registry.register(&admin, register(&["action.*"])).await.unwrap();
        fx.registry.register(&admin, register(&["*"])).await.unwrap();
        let event = fx.events.record(&admin, action_created()).await.unwrap();

        let first = fx.tracker.schedule_deliveries(event.id).await.unwrap();
        let second = fx.tracker.schedule_deliveries(event.id).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());

        let all = fx.tracker.list_for_event(&admin, event.id, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|d| d.status == DeliveryStatus::Pending));
    }

    #[tokio::test]
    async fn test_fan_out_skips_unsubscribed_paused_and_foreign_endpoints() {
        let fx = webhooks(RetryPolicy::default());
        let admin = ctx(Role::Admin);
        let subscribed = fx.registry.register(&admin, register(&["action.created"])).await.unwrap();
        fx.registry.register(&admin, register(&["knowledge.*"])).await.unwrap();
        let paused = fx.registry.register(&admin, register(&["*"])).await.unwrap();
        fx.registry.suspend(&admin, paused.id).await.unwrap();
        fx.registry.register(&ctx(Role::Admin), register(&["*"])).await.unwrap();

        let event = fx.events.record(&admin, action_created()).await.unwrap();
        let created = fx.tracker.fan_out(event.id).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].webhook_endpoint_id, subscribed.id);

        let event = fx.events.get(&admin, event.id).await.unwrap();
        assert!(event.processed);
    }

    #[tokio::test]
    async fn test_fan_out_pending_processes_backlog() {
        let fx = webhooks(RetryPolicy::default());
        let admin = ctx(Role::Admin);
        fx.registry.register(&admin, register(&["*"])).await.unwrap();
        fx.events.record(&admin, action_created()).await.unwrap();
        fx.events.record(&admin, action_created()).await.unwrap();

        assert_eq!(fx.tracker.fan_out_pending(10).await.unwrap(), 2);
        assert_eq!(fx.tracker.fan_out_pending(10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_three_failures_exhaust_retry_budget() {
        let fx = webhooks(RetryPolicy::default());
        let admin = ctx(Role::Admin);
        let mut req = register(&["*"]);
        req.retry_count = Some(3);
        let endpoint = fx.registry.register(&admin, req).await.unwrap();
        let event = fx.events.record(&admin, action_created()).await.unwrap();
        let delivery = fx.tracker.fan_out(event.id).await.unwrap().remove(0);
        assert_eq!(delivery.status, DeliveryStatus::Pending);

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let recorded = fx.tracker.record_attempt(delivery.id, &failure()).await.unwrap();
            statuses.push(recorded.delivery.status);
        }
        assert_eq!(
            statuses,
            vec![
                DeliveryStatus::Retrying,
                DeliveryStatus::Retrying,
                DeliveryStatus::Failed
            ]
        );

        let endpoint = fx.registry.get(&admin, endpoint.id).await.unwrap();
        assert_eq!(endpoint.failure_count, 1);

        let err = fx.tracker.record_attempt(delivery.id, &failure()).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
        let delivery = fx.tracker.get(&admin, delivery.id).await.unwrap();
        assert!(delivery.attempt_count <= endpoint.retry_count + 1);
        assert!(delivery.next_retry_at.is_none());
    }

    #[tokio::test]
    async fn test_threshold_marks_endpoint_failed() {
        let policy = RetryPolicy {
            failure_threshold: 2,
            ..RetryPolicy::default()
        };
        let fx = webhooks(policy);
        let admin = ctx(Role::Admin);
        let mut req = register(&["*"]);
        req.retry_count = Some(0);
        let endpoint = fx.registry.register(&admin, req).await.unwrap();

        for _ in 0..2 {
            let event = fx.events.record(&admin, action_created()).await.unwrap();
            let delivery = fx.tracker.fan_out(event.id).await.unwrap().remove(0);
            fx.tracker.record_attempt(delivery.id, &failure()).await.unwrap();
        }

        let endpoint = fx.registry.get(&admin, endpoint.id).await.unwrap();
        assert_eq!(endpoint.status, EndpointStatus::Failed);
        assert_eq!(endpoint.failure_count, 2);

        let event = fx.events.record(&admin, action_created()).await.unwrap();
        assert!(fx.tracker.fan_out(event.id).await.unwrap().is_empty());

        let resumed = fx.registry.resume(&admin, endpoint.id).await.unwrap();
        assert_eq!(resumed.failure_count, 0);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let fx = webhooks(RetryPolicy::default());
        let admin = ctx(Role::Admin);
        let mut req = register(&["*"]);
        req.retry_count = Some(0);
        fx.registry.register(&admin, req).await.unwrap();

        let event = fx.events.record(&admin, action_created()).await.unwrap();
        let delivery = fx.tracker.fan_out(event.id).await.unwrap().remove(0);
        fx.tracker.record_attempt(delivery.id, &failure()).await.unwrap();

        let event = fx.events.record(&admin, action_created()).await.unwrap();
        let delivery = fx.tracker.fan_out(event.id).await.unwrap().remove(0);
        let recorded = fx.tracker.record_attempt(delivery.id, &success()).await.unwrap();

        assert_eq!(recorded.delivery.status, DeliveryStatus::Sent);
        assert_eq!(recorded.endpoint.failure_count, 0);
        assert!(recorded.endpoint.last_success_at.is_some());

        let stats = fx.tracker.stats(&admin).await.unwrap();
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_claim_due_returns_pending_once() {
        let fx = webhooks(RetryPolicy::default());
        let admin = ctx(Role::Admin);
        fx.registry.register(&admin, register(&["*"])).await.unwrap();
        let event = fx.events.record(&admin, action_created()).await.unwrap();
        fx.tracker.fan_out(event.id).await.unwrap();

        let claimed = fx.tracker.claim_due(10, 30).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].event.id, event.id);
        assert!(fx.tracker.claim_due(10, 30).await.unwrap().is_empty());
        assert!(fx.tracker.claim_due(0, 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_delivery_is_not_found() {
        let fx = webhooks(RetryPolicy::default());
        let admin = ctx(Role::Admin);
        fx.registry.register(&admin, register(&["*"])).await.unwrap();
        let event = fx.events.record(&admin, action_created()).await.unwrap();
        let delivery = fx.tracker.fan_out(event.id).await.unwrap().remove(0);

        let err = fx.tracker.get(&ctx(Role::Admin), delivery.id).await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }
}
