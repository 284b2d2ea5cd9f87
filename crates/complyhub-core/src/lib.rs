//! # complyhub-core
//!
//! Core crate for ComplyHub. Contains configuration schemas, pagination
//! and response types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ComplyHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
