//! Webhook delivery worker and scheduled maintenance for ComplyHub.
//!
//! This crate provides:
//! - A dispatcher that performs the outbound HTTP call for one delivery
//! - A worker runner that fans out events, claims due deliveries and
//!   dispatches them with bounded concurrency
//! - A cron scheduler for periodic maintenance tasks

pub mod dispatcher;
pub mod runner;
pub mod scheduler;

pub use dispatcher::{DeliverySender, DispatchError, WebhookDispatcher};
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
