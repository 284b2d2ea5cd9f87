//! # complyhub-entity
//!
//! Domain entity models for ComplyHub. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.
//!
//! Status transitions that must behave identically across storage backends
//! (delivery attempts, action workflow) live here as pure functions.

pub mod action;
pub mod api_key;
pub mod knowledge;
pub mod organisation;
pub mod user;
pub mod webhook;
