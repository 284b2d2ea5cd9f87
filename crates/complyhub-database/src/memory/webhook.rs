//! Endpoints, events, deliveries and the incoming log.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_core::result::AppResult;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_entity::webhook::{
    AttemptOutcome, CreateIncomingWebhookLog, CreateWebhookEvent, DeliveryStats, DeliveryStatus,
    EndpointConfig, EndpointStatus, IncomingWebhookLog, RetryPolicy, WebhookDelivery,
    WebhookEndpoint, WebhookEvent, plan_attempt,
};

use super::MemoryStore;
use crate::store::{
    ClaimedDelivery, DeliveryStore, EndpointStore, EventFilter, EventStore, IncomingFilter,
    IncomingLogStore, RecordedAttempt,
};

#[async_trait]
impl EndpointStore for MemoryStore {
    async fn create(
        &self,
        organisation_id: Uuid,
        created_by: Option<Uuid>,
        config: &EndpointConfig,
    ) -> AppResult<WebhookEndpoint> {
        let now = Utc::now();
        let endpoint = WebhookEndpoint {
            id: Uuid::new_v4(),
            organisation_id,
            name: config.name.clone(),
            url: config.url.clone(),
            auth_type: config.auth_type,
            auth_value: config.auth_value.clone(),
            events: config.events.clone(),
            status: EndpointStatus::Active,
            retry_count: config.retry_count,
            timeout_ms: config.timeout_ms,
            failure_count: 0,
            last_success_at: None,
            last_failure_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.endpoints.insert(endpoint.id, endpoint.clone());
        Ok(endpoint)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookEndpoint>> {
        Ok(self.state.read().await.endpoints.get(&id).cloned())
    }

    async fn list_by_organisation(
        &self,
        organisation_id: Uuid,
        status: Option<EndpointStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookEndpoint>> {
        let state = self.state.read().await;
        let mut items: Vec<WebhookEndpoint> = state
            .endpoints
            .values()
            .filter(|e| e.organisation_id == organisation_id)
            .filter(|e| status.is_none_or(|s| e.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PageResponse::from_slice(items, page))
    }

    async fn list_subscribed(
        &self,
        organisation_id: Uuid,
        event_type: &str,
    ) -> AppResult<Vec<WebhookEndpoint>> {
        let state = self.state.read().await;
        let mut items: Vec<WebhookEndpoint> = state
            .endpoints
            .values()
            .filter(|e| e.organisation_id == organisation_id && e.accepts(event_type))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn update_config(
        &self,
        id: Uuid,
        config: &EndpointConfig,
    ) -> AppResult<WebhookEndpoint> {
        let mut state = self.state.write().await;
        let endpoint = state
            .endpoints
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Webhook endpoint {id} not found")))?;
        endpoint.name = config.name.clone();
        endpoint.url = config.url.clone();
        endpoint.auth_type = config.auth_type;
        endpoint.auth_value = config.auth_value.clone();
        endpoint.events = config.events.clone();
        endpoint.retry_count = config.retry_count;
        endpoint.timeout_ms = config.timeout_ms;
        endpoint.updated_at = Utc::now();
        Ok(endpoint.clone())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: EndpointStatus,
        reset_failures: bool,
    ) -> AppResult<WebhookEndpoint> {
        let mut state = self.state.write().await;
        let endpoint = state
            .endpoints
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Webhook endpoint {id} not found")))?;
        endpoint.status = status;
        if reset_failures {
            endpoint.failure_count = 0;
        }
        endpoint.updated_at = Utc::now();
        Ok(endpoint.clone())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create(&self, data: &CreateWebhookEvent) -> AppResult<WebhookEvent> {
        let event = WebhookEvent {
            id: Uuid::new_v4(),
            organisation_id: data.organisation_id,
            event_type: data.event_type.clone(),
            entity_type: data.entity_type.clone(),
            entity_id: data.entity_id.clone(),
            payload: data.payload.clone(),
            processed: false,
            processed_at: None,
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookEvent>> {
        Ok(self.state.read().await.events.get(&id).cloned())
    }

    async fn list(
        &self,
        organisation_id: Uuid,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookEvent>> {
        let state = self.state.read().await;
        let mut items: Vec<WebhookEvent> = state
            .events
            .values()
            .filter(|e| e.organisation_id == organisation_id)
            .filter(|e| filter.event_type.as_ref().is_none_or(|t| &e.event_type == t))
            .filter(|e| filter.processed.is_none_or(|p| e.processed == p))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PageResponse::from_slice(items, page))
    }

    async fn list_unprocessed(&self, limit: u32) -> AppResult<Vec<WebhookEvent>> {
        let state = self.state.read().await;
        let mut items: Vec<WebhookEvent> = state
            .events
            .values()
            .filter(|e| !e.processed)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn mark_processed(&self, id: Uuid) -> AppResult<WebhookEvent> {
        let mut state = self.state.write().await;
        let event = state
            .events
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Webhook event {id} not found")))?;
        if !event.processed {
            event.processed = true;
            event.processed_at = Some(Utc::now());
        }
        Ok(event.clone())
    }
}

#[async_trait]
impl DeliveryStore for MemoryStore {
    async fn create_pending(
        &self,
        endpoint_id: Uuid,
        event_id: Uuid,
    ) -> AppResult<Option<WebhookDelivery>> {
        let mut state = self.state.write().await;
        let exists = state
            .deliveries
            .values()
            .any(|d| d.webhook_endpoint_id == endpoint_id && d.event_id == event_id);
        if exists {
            return Ok(None);
        }
        let delivery = WebhookDelivery::pending(endpoint_id, event_id, Utc::now());
        state.deliveries.insert(delivery.id, delivery.clone());
        Ok(Some(delivery))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WebhookDelivery>> {
        Ok(self.state.read().await.deliveries.get(&id).cloned())
    }

    async fn list_by_event(
        &self,
        event_id: Uuid,
        status: Option<DeliveryStatus>,
    ) -> AppResult<Vec<WebhookDelivery>> {
        let state = self.state.read().await;
        let mut items: Vec<WebhookDelivery> = state
            .deliveries
            .values()
            .filter(|d| d.event_id == event_id)
            .filter(|d| status.is_none_or(|s| d.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn list_by_endpoint(
        &self,
        endpoint_id: Uuid,
        status: Option<DeliveryStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<WebhookDelivery>> {
        let state = self.state.read().await;
        let mut items: Vec<WebhookDelivery> = state
            .deliveries
            .values()
            .filter(|d| d.webhook_endpoint_id == endpoint_id)
            .filter(|d| status.is_none_or(|s| d.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PageResponse::from_slice(items, page))
    }

    async fn claim_due(&self, limit: u32, grace_seconds: u64) -> AppResult<Vec<ClaimedDelivery>> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let mut due: Vec<(DateTime<Utc>, Uuid)> = state
            .deliveries
            .values()
            .filter(|d| d.is_due(now))
            .filter(|d| {
                state
                    .endpoints
                    .get(&d.webhook_endpoint_id)
                    .is_some_and(|e| e.status.is_dispatchable())
            })
            .map(|d| (d.next_retry_at.unwrap_or(d.created_at), d.id))
            .collect();
        due.sort();
        due.truncate(limit as usize);

        let grace = Duration::seconds(grace_seconds.min(86_400) as i64);
        let mut claimed = Vec::with_capacity(due.len());
        for (_, id) in due {
            let Some(delivery) = state.deliveries.get(&id).cloned() else {
                continue;
            };
            let (Some(endpoint), Some(event)) = (
                state.endpoints.get(&delivery.webhook_endpoint_id).cloned(),
                state.events.get(&delivery.event_id).cloned(),
            ) else {
                continue;
            };
            let lease = Duration::milliseconds(i64::from(endpoint.timeout_ms)) + grace;
            let Some(row) = state.deliveries.get_mut(&id) else {
                continue;
            };
            row.claimed_until = Some(now + lease);
            row.updated_at = now;
            claimed.push(ClaimedDelivery {
                delivery: row.clone(),
                endpoint,
                event,
            });
        }
        Ok(claimed)
    }

    async fn record_attempt(
        &self,
        id: Uuid,
        outcome: &AttemptOutcome,
        policy: &RetryPolicy,
    ) -> AppResult<RecordedAttempt> {
        let mut state = self.state.write().await;
        let delivery = state
            .deliveries
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Delivery {id} not found")))?;
        let endpoint = state
            .endpoints
            .get(&delivery.webhook_endpoint_id)
            .cloned()
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Webhook endpoint {} not found",
                    delivery.webhook_endpoint_id
                ))
            })?;

        let plan = plan_attempt(&delivery, &endpoint, outcome, policy, Utc::now())?;

        let mut delivery = delivery;
        let mut endpoint = endpoint;
        plan.apply_to_delivery(&mut delivery);
        plan.apply_to_endpoint(&mut endpoint);
        state.deliveries.insert(delivery.id, delivery.clone());
        state.endpoints.insert(endpoint.id, endpoint.clone());

        Ok(RecordedAttempt { delivery, endpoint })
    }

    async fn stats(&self, organisation_id: Uuid) -> AppResult<DeliveryStats> {
        let state = self.state.read().await;
        let mut stats = DeliveryStats::default();
        for delivery in state.deliveries.values() {
            let owned = state
                .endpoints
                .get(&delivery.webhook_endpoint_id)
                .is_some_and(|e| e.organisation_id == organisation_id);
            if owned {
                stats.add(delivery.status, 1);
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl IncomingLogStore for MemoryStore {
    async fn create(&self, data: &CreateIncomingWebhookLog) -> AppResult<IncomingWebhookLog> {
        let log = IncomingWebhookLog {
            id: Uuid::new_v4(),
            source: data.source.clone(),
            event_type: data.event_type.clone(),
            payload: data.payload.clone(),
            headers: data.headers.clone(),
            processed: false,
            processed_at: None,
            error_message: None,
            created_at: Utc::now(),
        };
        let mut state = self.state.write().await;
        state.incoming.insert(log.id, log.clone());
        Ok(log)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<IncomingWebhookLog>> {
        Ok(self.state.read().await.incoming.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &IncomingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<IncomingWebhookLog>> {
        let state = self.state.read().await;
        let mut items: Vec<IncomingWebhookLog> = state
            .incoming
            .values()
            .filter(|l| filter.source.as_ref().is_none_or(|s| &l.source == s))
            .filter(|l| filter.processed.is_none_or(|p| l.processed == p))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PageResponse::from_slice(items, page))
    }

    async fn mark_processed(&self, id: Uuid) -> AppResult<IncomingWebhookLog> {
        let mut state = self.state.write().await;
        let log = state
            .incoming
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Incoming webhook log {id} not found")))?;
        if !log.processed {
            log.processed = true;
            log.processed_at = Some(Utc::now().max(log.created_at));
        }
        log.error_message = None;
        Ok(log.clone())
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> AppResult<IncomingWebhookLog> {
        let mut state = self.state.write().await;
        let log = state
            .incoming
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Incoming webhook log {id} not found")))?;
        if log.processed {
            return Err(AppError::conflict(format!(
                "Incoming webhook log {id} is already processed"
            )));
        }
        log.error_message = Some(error_message.to_string());
        Ok(log.clone())
    }

    async fn purge_processed(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let len = state.incoming.len();
        state
            .incoming
            .retain(|_, l| !(l.processed && l.processed_at.is_some_and(|at| at < before)));
        Ok((len - state.incoming.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complyhub_entity::webhook::WebhookAuthType;

    fn config() -> EndpointConfig {
        EndpointConfig {
            name: "ops".into(),
            url: "https://hooks.example.com/in".into(),
            auth_type: WebhookAuthType::None,
            auth_value: None,
            events: vec!["action.*".into()],
            retry_count: 2,
            timeout_ms: 5_000,
        }
    }

    async fn seed(store: &MemoryStore) -> (WebhookEndpoint, WebhookEvent) {
        let org = Uuid::new_v4();
        let endpoint = EndpointStore::create(store, org, None, &config()).await.unwrap();
        let event = EventStore::create(
            store,
            &CreateWebhookEvent {
                organisation_id: org,
                event_type: "action.created".into(),
                entity_type: "remedial_action".into(),
                entity_id: "a-1".into(),
                payload: serde_json::json!({"title": "Replace RCD"}),
            },
        )
        .await
        .unwrap();
        (endpoint, event)
    }

    #[tokio::test]
    async fn test_create_pending_is_idempotent() {
        let store = MemoryStore::new();
        let (endpoint, event) = seed(&store).await;
        assert!(store.create_pending(endpoint.id, event.id).await.unwrap().is_some());
        assert!(store.create_pending(endpoint.id, event.id).await.unwrap().is_none());
        assert_eq!(store.list_by_event(event.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_excludes_claimed_and_paused() {
        let store = MemoryStore::new();
        let (endpoint, event) = seed(&store).await;
        store.create_pending(endpoint.id, event.id).await.unwrap();

        let first = store.claim_due(10, 30).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].delivery.claimed_until.is_some());
        assert!(store.claim_due(10, 30).await.unwrap().is_empty());

        let other = EventStore::create(
            &store,
            &CreateWebhookEvent {
                organisation_id: endpoint.organisation_id,
                event_type: "action.created".into(),
                entity_type: "remedial_action".into(),
                entity_id: "a-2".into(),
                payload: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
        store.create_pending(endpoint.id, other.id).await.unwrap();
        store
            .set_status(endpoint.id, EndpointStatus::Paused, false)
            .await
            .unwrap();
        assert!(store.claim_due(10, 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_attempt_releases_claim() {
        let store = MemoryStore::new();
        let (endpoint, event) = seed(&store).await;
        let delivery = store
            .create_pending(endpoint.id, event.id)
            .await
            .unwrap()
            .unwrap();
        store.claim_due(1, 30).await.unwrap();

        let outcome = AttemptOutcome::Failure {
            response_status: None,
            response_body: None,
            duration_ms: None,
            error_message: "connection refused".into(),
        };
        let recorded = store
            .record_attempt(delivery.id, &outcome, &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(recorded.delivery.status, DeliveryStatus::Retrying);
        assert_eq!(recorded.delivery.claimed_until, None);
        assert!(recorded.delivery.next_retry_at.is_some());
    }

    #[tokio::test]
    async fn test_incoming_lifecycle() {
        let store = MemoryStore::new();
        let log = IncomingLogStore::create(
            &store,
            &CreateIncomingWebhookLog {
                source: "contractor-portal".into(),
                event_type: Some("job.completed".into()),
                payload: serde_json::json!({"job": 7}),
                headers: serde_json::json!({}),
            },
        )
        .await
        .unwrap();

        let failed = store.mark_failed(log.id, "unknown job").await.unwrap();
        assert!(!failed.processed);
        assert_eq!(failed.error_message.as_deref(), Some("unknown job"));

        let done = IncomingLogStore::mark_processed(&store, log.id).await.unwrap();
        assert!(done.processed);
        assert!(done.processed_at.unwrap() >= done.created_at);
        assert_eq!(done.error_message, None);

        let err = store.mark_failed(log.id, "late").await.unwrap_err();
        assert!(err.is(complyhub_core::ErrorKind::Conflict));

        let purged = store
            .purge_processed(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(purged, 1);
    }

    #[tokio::test]
    async fn test_purge_keeps_recently_processed_old_entries() {
        let store = MemoryStore::new();
        let log = IncomingLogStore::create(
            &store,
            &CreateIncomingWebhookLog {
                source: "contractor-portal".into(),
                event_type: None,
                payload: serde_json::json!({}),
                headers: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
        if let Some(entry) = store.state.write().await.incoming.get_mut(&log.id) {
            entry.created_at = Utc::now() - Duration::days(60);
        }
        IncomingLogStore::mark_processed(&store, log.id).await.unwrap();

        let purged = store
            .purge_processed(Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(purged, 0);
        assert!(IncomingLogStore::find_by_id(&store, log.id).await.unwrap().is_some());
    }
}
