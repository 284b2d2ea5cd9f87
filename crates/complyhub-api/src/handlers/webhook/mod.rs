//! Webhook handlers: endpoints, events, deliveries and the incoming log.

pub mod delivery;
pub mod endpoint;
pub mod event;
pub mod incoming;

use serde::Deserialize;

use complyhub_entity::webhook::{DeliveryStatus, EndpointStatus};

/// `?status=` filter for endpoint listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointStatusQuery {
    /// Lifecycle status.
    pub status: Option<EndpointStatus>,
}

/// `?status=` filter for delivery listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryStatusQuery {
    /// Delivery status.
    pub status: Option<DeliveryStatus>,
}
