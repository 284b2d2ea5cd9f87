//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of roles. Authorization is decided by the capability set of a
/// role, never by comparing role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full control over the organisation, including API keys.
    Admin,
    /// Manages webhooks, actions and knowledge articles.
    Manager,
    /// Compliance officer: works remedial actions.
    Officer,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Role; 4] = [Self::Admin, Self::Manager, Self::Officer, Self::Viewer];

    /// Return the role as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Officer => "OFFICER",
            Self::Viewer => "VIEWER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = complyhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                complyhub_core::AppError::validation(format!(
                    "Invalid role: '{s}'. Expected one of: ADMIN, MANAGER, OFFICER, VIEWER"
                ))
            })
    }
}
