//! Webhook subsystem services.

pub mod event_log;
pub mod incoming;
pub mod registry;
pub mod tracker;

pub use event_log::{EventLog, RecordEvent};
pub use incoming::{IncomingLogService, IncomingRequest};
pub use registry::{EndpointPatch, EndpointRegistry, RegisterEndpoint};
pub use tracker::DeliveryTracker;
