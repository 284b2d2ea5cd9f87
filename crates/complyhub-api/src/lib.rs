//! # complyhub-api
//!
//! HTTP API layer for ComplyHub built on Axum. Every route lives under
//! `/api` and answers with the `{ "success": true, "data": ... }` envelope
//! or an [`AppError`](complyhub_core::AppError) body.

pub mod app;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, serve};
pub use state::AppState;
