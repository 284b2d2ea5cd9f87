//! API key entities.

pub mod model;

pub use model::{ApiKey, CreateApiKey};
