//! Event type names recorded by the application itself.

/// A remedial action was raised.
pub const ACTION_CREATED: &str = "action.created";
/// A remedial action moved to another kanban column.
pub const ACTION_STATUS_CHANGED: &str = "action.status_changed";
/// A knowledge article was published.
pub const KNOWLEDGE_CREATED: &str = "knowledge.created";
/// A knowledge article was edited.
pub const KNOWLEDGE_UPDATED: &str = "knowledge.updated";
/// A knowledge article was removed.
pub const KNOWLEDGE_DELETED: &str = "knowledge.deleted";

/// Entity type recorded alongside action events.
pub const ENTITY_ACTION: &str = "remedial_action";
/// Entity type recorded alongside knowledge events.
pub const ENTITY_KNOWLEDGE: &str = "knowledge_article";
