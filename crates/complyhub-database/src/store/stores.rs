//! The bundle of store handles injected into services.

use std::sync::Arc;

use sqlx::PgPool;

use super::{
    ActionStore, ApiKeyStore, DeliveryStore, EndpointStore, EventStore, IncomingLogStore,
    KnowledgeStore, OrganisationStore, UserStore,
};
use crate::repositories::{
    ActionRepository, ApiKeyRepository, DeliveryRepository, EndpointRepository, EventRepository,
    IncomingLogRepository, KnowledgeRepository, OrganisationRepository, UserRepository,
};

/// One handle per store trait. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Organisations.
    pub organisations: Arc<dyn OrganisationStore>,
    /// Users.
    pub users: Arc<dyn UserStore>,
    /// API keys.
    pub api_keys: Arc<dyn ApiKeyStore>,
    /// Webhook endpoints.
    pub endpoints: Arc<dyn EndpointStore>,
    /// Webhook events.
    pub events: Arc<dyn EventStore>,
    /// Webhook deliveries.
    pub deliveries: Arc<dyn DeliveryStore>,
    /// Incoming webhook logs.
    pub incoming: Arc<dyn IncomingLogStore>,
    /// Remedial actions.
    pub actions: Arc<dyn ActionStore>,
    /// Knowledge articles.
    pub knowledge: Arc<dyn KnowledgeStore>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            organisations: Arc::new(OrganisationRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            api_keys: Arc::new(ApiKeyRepository::new(pool.clone())),
            endpoints: Arc::new(EndpointRepository::new(pool.clone())),
            events: Arc::new(EventRepository::new(pool.clone())),
            deliveries: Arc::new(DeliveryRepository::new(pool.clone())),
            incoming: Arc::new(IncomingLogRepository::new(pool.clone())),
            actions: Arc::new(ActionRepository::new(pool.clone())),
            knowledge: Arc::new(KnowledgeRepository::new(pool)),
        }
    }

    /// In-memory stores sharing one state.
    #[cfg(feature = "memory")]
    pub fn memory() -> Self {
        let store = Arc::new(crate::memory::MemoryStore::new());
        Self {
            organisations: store.clone(),
            users: store.clone(),
            api_keys: store.clone(),
            endpoints: store.clone(),
            events: store.clone(),
            deliveries: store.clone(),
            incoming: store.clone(),
            actions: store.clone(),
            knowledge: store,
        }
    }
}
