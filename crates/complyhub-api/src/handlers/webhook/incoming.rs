//! Incoming webhook handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Uri};
use axum::response::Response;
use uuid::Uuid;

use complyhub_core::error::AppError;
use complyhub_core::types::PageResponse;
use complyhub_database::store::IncomingFilter;
use complyhub_entity::webhook::IncomingWebhookLog;
use complyhub_service::webhook::IncomingRequest;

use crate::dto::request::MarkFailedRequest;
use crate::dto::response::{ApiResponse, IncomingAccepted};
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::state::AppState;

/// POST /api/webhooks/incoming/{source}
///
/// Unauthenticated. Any body is accepted and stored; the caller gets
/// `202 Accepted` once the entry is persisted.
pub async fn receive_incoming(
    State(state): State<AppState>,
    Path(source): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let entry = state
        .incoming_log
        .ingest(IncomingRequest {
            source,
            event_type: event_type_from_query(&uri),
            body: body.to_vec(),
            headers,
        })
        .await?;

    Ok(ApiResponse::accepted(IncomingAccepted {
        id: entry.id,
        received: true,
        received_at: entry.created_at,
    }))
}

/// First non-blank `event_type` in the query string. A query that cannot
/// be parsed is ignored so the call is still stored.
fn event_type_from_query(uri: &Uri) -> Option<String> {
    let Query(pairs) = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparsable query on incoming webhook");
            return None;
        }
    };
    pairs
        .into_iter()
        .find(|(key, value)| key == "event_type" && !value.trim().is_empty())
        .map(|(_, value)| value)
}

/// GET /api/webhooks/incoming
pub async fn list_incoming(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<IncomingFilter>,
) -> Result<Json<ApiResponse<PageResponse<IncomingWebhookLog>>>, AppError> {
    let page = state
        .incoming_log
        .list(&auth, &filter, &params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/webhooks/incoming/{id}/processed
pub async fn mark_incoming_processed(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<IncomingWebhookLog>>, AppError> {
    let entry = state.incoming_log.mark_processed(&auth, id).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// POST /api/webhooks/incoming/{id}/failed
pub async fn mark_incoming_failed(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<MarkFailedRequest>,
) -> Result<Json<ApiResponse<IncomingWebhookLog>>, AppError> {
    let entry = state
        .incoming_log
        .mark_failed(&auth, id, &req.error_message)
        .await?;
    Ok(Json(ApiResponse::ok(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_type(uri: &str) -> Option<String> {
        event_type_from_query(&uri.parse::<Uri>().expect("uri"))
    }

    #[test]
    fn test_event_type_from_query() {
        assert_eq!(
            event_type("/in/x?event_type=job.done").as_deref(),
            Some("job.done")
        );
        assert_eq!(
            event_type("/in/x?event_type=a&event_type=b").as_deref(),
            Some("a")
        );
        assert_eq!(
            event_type("/in/x?event_type=&event_type=b").as_deref(),
            Some("b")
        );
        assert_eq!(event_type("/in/x"), None);
        assert_eq!(event_type("/in/x?other=1"), None);
    }
}
