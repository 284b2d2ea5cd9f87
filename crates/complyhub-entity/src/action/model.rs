//! Remedial action entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{ActionSeverity, ActionStatus};

/// Work raised against a property, usually from a certificate finding.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RemedialAction {
    /// Unique action identifier.
    pub id: Uuid,
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Property the action applies to.
    pub property_id: Option<Uuid>,
    /// Certificate that raised the action.
    pub certificate_id: Option<Uuid>,
    /// Short summary.
    pub title: String,
    /// Details.
    pub description: Option<String>,
    /// Urgency.
    pub severity: ActionSeverity,
    /// Kanban column.
    pub status: ActionStatus,
    /// Target completion date.
    pub due_date: Option<NaiveDate>,
    /// Set exactly when `status` is `COMPLETED`.
    pub completed_at: Option<DateTime<Utc>>,
    /// User who raised the action.
    pub created_by: Uuid,
    /// When the action was created.
    pub created_at: DateTime<Utc>,
    /// When the action was last updated.
    pub updated_at: DateTime<Utc>,
}

impl RemedialAction {
    /// Whether the action is past its due date and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_terminal() && self.due_date.is_some_and(|due| due < today)
    }
}

/// Data required to create an action.
#[derive(Debug, Clone)]
pub struct CreateRemedialAction {
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Property.
    pub property_id: Option<Uuid>,
    /// Source certificate.
    pub certificate_id: Option<Uuid>,
    /// Summary.
    pub title: String,
    /// Details.
    pub description: Option<String>,
    /// Urgency.
    pub severity: ActionSeverity,
    /// Target date.
    pub due_date: Option<NaiveDate>,
    /// Creator.
    pub created_by: Uuid,
}
