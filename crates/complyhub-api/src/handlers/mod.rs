//! Route handlers organized by domain.

pub mod action;
pub mod api_key;
pub mod auth;
pub mod health;
pub mod knowledge;
pub mod openapi;
pub mod webhook;
