//! Shared fixtures for service tests.

use std::sync::Arc;

use uuid::Uuid;

use complyhub_auth::RbacEnforcer;
use complyhub_core::config::WebhookConfig;
use complyhub_database::Stores;
use complyhub_entity::user::Role;
use complyhub_entity::webhook::{RetryPolicy, WebhookAuthType};

use crate::context::RequestContext;
use crate::webhook::{DeliveryTracker, EndpointRegistry, EventLog, RegisterEndpoint};

pub(crate) fn ctx(role: Role) -> RequestContext {
    RequestContext::for_user(Uuid::new_v4(), Uuid::new_v4(), role)
}

pub(crate) fn rbac() -> Arc<RbacEnforcer> {
    Arc::new(RbacEnforcer::new())
}

pub(crate) struct WebhookFixture {
    pub registry: EndpointRegistry,
    pub events: EventLog,
    pub tracker: DeliveryTracker,
}

pub(crate) fn webhooks(policy: RetryPolicy) -> WebhookFixture {
    let stores = Stores::memory();
    let registry = EndpointRegistry::new(stores.endpoints.clone(), rbac(), WebhookConfig::default());
    let events = EventLog::new(stores.events.clone(), rbac());
    let tracker = DeliveryTracker::new(
        stores.endpoints.clone(),
        stores.events.clone(),
        stores.deliveries.clone(),
        rbac(),
        policy,
    );
    WebhookFixture {
        registry,
        events,
        tracker,
    }
}

pub(crate) fn register(events: &[&str]) -> RegisterEndpoint {
    RegisterEndpoint {
        name: "Contractor portal".into(),
        url: "https://hooks.example.com/complyhub".into(),
        auth_type: WebhookAuthType::None,
        auth_value: None,
        events: events.iter().map(|e| e.to_string()).collect(),
        retry_count: None,
        timeout_ms: None,
    }
}
