//! # complyhub-database
//!
//! PostgreSQL connection management, the store traits every service is
//! written against, their PostgreSQL repositories, and (behind the `memory`
//! feature) an in-memory implementation used by tests.

pub mod connection;
#[cfg(feature = "memory")]
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::Stores;
