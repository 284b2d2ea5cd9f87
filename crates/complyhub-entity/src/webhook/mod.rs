//! Webhook domain entities: endpoints, events, deliveries and the incoming
//! log, plus the delivery-attempt state machine.

pub mod attempt;
pub mod delivery;
pub mod endpoint;
pub mod event;
pub mod event_type;
pub mod incoming;
pub mod status;
pub mod subscription;

pub use attempt::{AttemptOutcome, AttemptPlan, EndpointEffect, RetryPolicy, plan_attempt};
pub use delivery::{DeliveryStats, WebhookDelivery};
pub use endpoint::{EndpointConfig, WebhookEndpoint};
pub use event::{CreateWebhookEvent, WebhookEvent};
pub use incoming::{CreateIncomingWebhookLog, IncomingWebhookLog};
pub use status::{DeliveryStatus, EndpointStatus, WebhookAuthType};
