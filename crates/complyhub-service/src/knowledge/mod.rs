//! Knowledge base service.

pub mod service;

pub use service::{KnowledgeInput, KnowledgeService};
