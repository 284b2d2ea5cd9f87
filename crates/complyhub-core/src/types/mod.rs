//! Shared type definitions used across the ComplyHub workspace.

pub mod pagination;
pub mod response;

pub use pagination::{PageRequest, PageResponse};
pub use response::ApiErrorResponse;
