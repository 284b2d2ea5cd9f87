//! Remedial action status and severity enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kanban column of a remedial action.
///
/// The forward path is `OPEN -> IN_PROGRESS -> SCHEDULED -> COMPLETED`.
/// `CANCELLED` is reachable from every non-terminal status. `COMPLETED` and
/// `CANCELLED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "action_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    /// Raised, not yet picked up.
    Open,
    /// Being worked on.
    InProgress,
    /// Contractor visit booked.
    Scheduled,
    /// Remedied.
    Completed,
    /// Withdrawn.
    Cancelled,
}

impl ActionStatus {
    /// All statuses in board order.
    pub const ALL: [ActionStatus; 5] = [
        Self::Open,
        Self::InProgress,
        Self::Scheduled,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Check if the action is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The single forward transition offered by the "next status" control.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Open => Some(Self::InProgress),
            Self::InProgress => Some(Self::Scheduled),
            Self::Scheduled => Some(Self::Completed),
            Self::Completed | Self::Cancelled => None,
        }
    }

    /// Every status this one may move to.
    pub fn allowed_transitions(&self) -> Vec<Self> {
        match self.next() {
            Some(next) => vec![next, Self::Cancelled],
            None => Vec::new(),
        }
    }

    /// Check whether `target` is a legal transition from this status.
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Scheduled => "SCHEDULED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency of a remedial action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "action_severity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionSeverity {
    /// Danger to life; make safe now.
    Immediate,
    /// Fix within days.
    Urgent,
    /// Fix within weeks.
    Priority,
    /// Fix at the next planned visit.
    Routine,
    /// Recommendation only.
    Advisory,
}

impl ActionSeverity {
    /// Return the severity as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "IMMEDIATE",
            Self::Urgent => "URGENT",
            Self::Priority => "PRIORITY",
            Self::Routine => "ROUTINE",
            Self::Advisory => "ADVISORY",
        }
    }
}

impl fmt::Display for ActionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
