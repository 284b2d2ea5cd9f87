//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use complyhub_auth::{JwtDecoder, JwtEncoder, PasswordValidator, RbacEnforcer};
use complyhub_core::config::AppConfig;
use complyhub_database::{DatabasePool, Stores};
use complyhub_entity::webhook::RetryPolicy;
use complyhub_service::{
    ActionService, ApiKeyService, AuthService, DeliveryTracker, EndpointRegistry, EventLog,
    IncomingLogService, KnowledgeService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL pool. `None` when running over in-memory stores.
    pub database: Option<DatabasePool>,

    // ── Auth ─────────────────────────────────────────────────
    /// Role to capability enforcement
    pub rbac: Arc<RbacEnforcer>,
    /// Sign-up, sign-in and credential resolution
    pub auth_service: Arc<AuthService>,
    /// Organisation API keys
    pub api_key_service: Arc<ApiKeyService>,

    // ── Webhooks ─────────────────────────────────────────────
    /// Endpoint registry
    pub endpoint_registry: Arc<EndpointRegistry>,
    /// Event log
    pub event_log: Arc<EventLog>,
    /// Delivery tracker
    pub delivery_tracker: Arc<DeliveryTracker>,
    /// Incoming webhook log
    pub incoming_log: Arc<IncomingLogService>,

    // ── Compliance workflow ──────────────────────────────────
    /// Remedial actions
    pub action_service: Arc<ActionService>,
    /// Knowledge base
    pub knowledge_service: Arc<KnowledgeService>,
}

impl AppState {
    /// Wire every service over `stores`.
    pub fn new(config: AppConfig, stores: Stores, database: Option<DatabasePool>) -> Self {
        let rbac = Arc::new(RbacEnforcer::new());

        let api_keys = ApiKeyService::new(stores.api_keys.clone(), Arc::clone(&rbac));
        let auth_service = AuthService::new(
            stores.organisations.clone(),
            stores.users.clone(),
            PasswordValidator::new(&config.auth),
            JwtEncoder::new(&config.auth),
            JwtDecoder::new(&config.auth),
            api_keys.clone(),
        );

        let event_log = EventLog::new(stores.events.clone(), Arc::clone(&rbac));
        let endpoint_registry = EndpointRegistry::new(
            stores.endpoints.clone(),
            Arc::clone(&rbac),
            config.webhooks.clone(),
        );
        let delivery_tracker = DeliveryTracker::new(
            stores.endpoints.clone(),
            stores.events.clone(),
            stores.deliveries.clone(),
            Arc::clone(&rbac),
            RetryPolicy::from_config(&config.webhooks),
        );
        let incoming_log = IncomingLogService::new(stores.incoming.clone(), Arc::clone(&rbac));

        let action_service =
            ActionService::new(stores.actions.clone(), event_log.clone(), Arc::clone(&rbac));
        let knowledge_service =
            KnowledgeService::new(stores.knowledge.clone(), event_log.clone(), Arc::clone(&rbac));

        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            database,
            rbac,
            auth_service: Arc::new(auth_service),
            api_key_service: Arc::new(api_keys),
            endpoint_registry: Arc::new(endpoint_registry),
            event_log: Arc::new(event_log),
            delivery_tracker: Arc::new(delivery_tracker),
            incoming_log: Arc::new(incoming_log),
            action_service: Arc::new(action_service),
            knowledge_service: Arc::new(knowledge_service),
        }
    }
}
