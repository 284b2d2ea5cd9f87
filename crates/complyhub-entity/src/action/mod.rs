//! Remedial action entities and the kanban status workflow.

pub mod model;
pub mod status;

pub use model::{CreateRemedialAction, RemedialAction};
pub use status::{ActionSeverity, ActionStatus};
