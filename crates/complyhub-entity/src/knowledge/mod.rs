//! Knowledge base entities.

pub mod model;

pub use model::{CreateKnowledgeArticle, KnowledgeArticle, UpdateKnowledgeArticle};
