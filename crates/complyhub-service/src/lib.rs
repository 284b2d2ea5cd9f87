//! # complyhub-service
//!
//! Business logic service layer for ComplyHub. Each service orchestrates
//! store traits and auth primitives to implement application-level use
//! cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references. Capability checks happen here,
//! not in the HTTP layer.

pub mod action;
pub mod auth;
pub mod context;
pub mod knowledge;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

pub use action::ActionService;
pub use auth::{ApiKeyService, AuthService};
pub use context::RequestContext;
pub use knowledge::KnowledgeService;
pub use webhook::{DeliveryTracker, EndpointRegistry, EventLog, IncomingLogService};
