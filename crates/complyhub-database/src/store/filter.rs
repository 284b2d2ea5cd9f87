//! List filters shared by every store implementation.

use serde::Deserialize;
use uuid::Uuid;

use complyhub_entity::action::ActionStatus;

/// Event log filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    /// Exact event type.
    pub event_type: Option<String>,
    /// Processed flag.
    pub processed: Option<bool>,
}

/// Incoming log filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingFilter {
    /// Exact source.
    pub source: Option<String>,
    /// Processed flag. `Some(false)` lists the replay queue.
    pub processed: Option<bool>,
}

/// Remedial action filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionFilter {
    /// Kanban column.
    pub status: Option<ActionStatus>,
    /// Property.
    pub property_id: Option<Uuid>,
}

/// Knowledge article filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeFilter {
    /// Exact category.
    pub category: Option<String>,
    /// Case-insensitive text search over title, content and tags.
    pub q: Option<String>,
}
