//! In-memory implementation of every store trait.
//!
//! All state sits behind one [`tokio::sync::RwLock`], so each trait method
//! is atomic with respect to every other. Ordering and filtering mirror the
//! SQL in [`crate::repositories`].

mod account;
mod content;
mod webhook;

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use complyhub_entity::action::RemedialAction;
use complyhub_entity::api_key::ApiKey;
use complyhub_entity::knowledge::KnowledgeArticle;
use complyhub_entity::organisation::Organisation;
use complyhub_entity::user::User;
use complyhub_entity::webhook::{IncomingWebhookLog, WebhookDelivery, WebhookEndpoint, WebhookEvent};

/// Process-local store. Clone the `Arc` around it, not the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    organisations: HashMap<Uuid, Organisation>,
    users: HashMap<Uuid, User>,
    api_keys: HashMap<Uuid, ApiKey>,
    endpoints: HashMap<Uuid, WebhookEndpoint>,
    events: HashMap<Uuid, WebhookEvent>,
    deliveries: HashMap<Uuid, WebhookDelivery>,
    incoming: HashMap<Uuid, IncomingWebhookLog>,
    actions: HashMap<Uuid, RemedialAction>,
    knowledge: HashMap<Uuid, KnowledgeArticle>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}
