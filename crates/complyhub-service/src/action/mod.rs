//! Remedial action service.

pub mod service;

pub use service::{ActionService, CreateAction};
