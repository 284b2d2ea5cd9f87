//! PostgreSQL repository implementations of the store traits.

pub mod action;
pub mod api_key;
pub mod delivery;
pub mod endpoint;
pub mod event;
pub mod incoming;
pub mod knowledge;
pub mod organisation;
pub mod user;

pub use action::ActionRepository;
pub use api_key::ApiKeyRepository;
pub use delivery::DeliveryRepository;
pub use endpoint::EndpointRepository;
pub use event::EventRepository;
pub use incoming::IncomingLogRepository;
pub use knowledge::KnowledgeRepository;
pub use organisation::OrganisationRepository;
pub use user::UserRepository;

use complyhub_core::error::{AppError, ErrorKind};

/// Map an insert error, turning unique violations into `Conflict`.
pub(crate) fn map_insert_error(err: sqlx::Error, conflict: &str, context: &str) -> AppError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        AppError::conflict(conflict)
    } else {
        AppError::with_source(ErrorKind::Database, context, err)
    }
}

/// Page bounds as SQL parameters.
pub(crate) fn page_bounds(page: &complyhub_core::types::PageRequest) -> (i64, i64) {
    (page.limit() as i64, page.offset() as i64)
}
