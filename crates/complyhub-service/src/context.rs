//! Request context carrying the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use complyhub_entity::user::Role;

/// Context for the current authenticated request.
///
/// Built by the HTTP extractor from a bearer token or API key and passed
/// into service methods so that every operation knows who is acting and
/// for which organisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user (the key's creator for API-key requests).
    pub user_id: Uuid,
    /// Organisation every lookup is scoped to.
    pub organisation_id: Uuid,
    /// Role used for capability checks.
    pub role: Role,
    /// Set when the request authenticated with an API key.
    pub api_key_id: Option<Uuid>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Context for a user authenticated with a bearer token.
    pub fn for_user(user_id: Uuid, organisation_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            organisation_id,
            role,
            api_key_id: None,
            request_time: Utc::now(),
        }
    }

    /// Context for a request authenticated with an API key.
    pub fn for_api_key(
        api_key_id: Uuid,
        created_by: Uuid,
        organisation_id: Uuid,
        role: Role,
    ) -> Self {
        Self {
            user_id: created_by,
            organisation_id,
            role,
            api_key_id: Some(api_key_id),
            request_time: Utc::now(),
        }
    }

    /// Whether `organisation_id` is the caller's organisation.
    pub fn owns(&self, organisation_id: Uuid) -> bool {
        self.organisation_id == organisation_id
    }
}
