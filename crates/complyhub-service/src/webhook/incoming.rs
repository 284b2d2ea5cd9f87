//! Incoming webhook log: ingestion, replay bookkeeping and retention.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use complyhub_auth::{Capability, RbacEnforcer};
use complyhub_core::AppError;
use complyhub_core::types::pagination::{PageRequest, PageResponse};
use complyhub_database::store::{IncomingFilter, IncomingLogStore};
use complyhub_entity::webhook::{CreateIncomingWebhookLog, IncomingWebhookLog};

use crate::context::RequestContext;

/// Headers whose values are never stored.
pub const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "x-api-key"];
/// Stored in place of a redacted header value.
pub const REDACTED: &str = "[REDACTED]";
/// Headers consulted, in order, when the caller gives no event type.
const EVENT_TYPE_HEADERS: [&str; 3] = ["x-event-type", "x-webhook-event", "x-github-event"];
/// Payload fields consulted when no event-type header is present.
const EVENT_TYPE_FIELDS: [&str; 2] = ["event_type", "type"];
/// Maximum stored source length.
const MAX_SOURCE_LEN: usize = 100;

/// An inbound webhook call as received over HTTP.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    /// Sender label from the URL.
    pub source: String,
    /// Explicit event type, if the caller named one.
    pub event_type: Option<String>,
    /// Raw request body.
    pub body: Vec<u8>,
    /// Request headers as received.
    pub headers: Vec<(String, String)>,
}

/// Records inbound webhook calls and tracks their processing.
///
/// The log is global: inbound calls arrive unauthenticated and carry no
/// organisation.
#[derive(Debug, Clone)]
pub struct IncomingLogService {
    /// Incoming log store.
    incoming: Arc<dyn IncomingLogStore>,
    /// RBAC enforcer.
    rbac: Arc<RbacEnforcer>,
}

impl IncomingLogService {
    /// Creates a new incoming log service.
    pub fn new(incoming: Arc<dyn IncomingLogStore>, rbac: Arc<RbacEnforcer>) -> Self {
        Self { incoming, rbac }
    }

    /// Persist an inbound call. Any body is accepted; one that is not JSON
    /// is stored as a JSON string.
    pub async fn ingest(&self, req: IncomingRequest) -> Result<IncomingWebhookLog, AppError> {
        let payload = parse_payload(&req.body);
        let event_type = req
            .event_type
            .map(|t| strip_nul(t.trim()))
            .filter(|t| !t.is_empty())
            .or_else(|| infer_event_type(&req.headers, &payload));

        let data = CreateIncomingWebhookLog {
            source: normalize_source(&req.source),
            event_type,
            payload,
            headers: redact_headers(&req.headers),
        };
        let entry = self.incoming.create(&data).await?;

        info!(
            log_id = %entry.id,
            source = %entry.source,
            event_type = ?entry.event_type,
            "Incoming webhook logged"
        );
        Ok(entry)
    }

    /// Get a log entry.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> Result<IncomingWebhookLog, AppError> {
        self.rbac.require(ctx.role, Capability::ReplayIncoming)?;
        self.incoming
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Incoming webhook {id} not found")))
    }

    /// List entries. Filter `processed = false` for the replay queue.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: &IncomingFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<IncomingWebhookLog>, AppError> {
        self.rbac.require(ctx.role, Capability::ReplayIncoming)?;
        self.incoming.list(filter, page).await
    }

    /// Entries still awaiting processing.
    pub async fn list_unprocessed(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> Result<PageResponse<IncomingWebhookLog>, AppError> {
        let filter = IncomingFilter {
            source: None,
            processed: Some(false),
        };
        self.list(ctx, &filter, page).await
    }

    /// Mark processed and clear any error. Idempotent.
    pub async fn mark_processed(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<IncomingWebhookLog, AppError> {
        self.rbac.require(ctx.role, Capability::ReplayIncoming)?;
        self.incoming.mark_processed(id).await
    }

    /// Record a processing error, leaving the entry in the replay queue.
    pub async fn mark_failed(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        message: &str,
    ) -> Result<IncomingWebhookLog, AppError> {
        self.rbac.require(ctx.role, Capability::ReplayIncoming)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::validation("error_message must not be empty"));
        }
        let entry = self.incoming.mark_failed(id, message).await?;
        warn!(log_id = %id, error = %message, "Incoming webhook marked failed");
        Ok(entry)
    }

    /// Delete processed entries older than `retention_days`.
    pub async fn purge_processed(&self, retention_days: u32) -> Result<u64, AppError> {
        let before = Utc::now() - Duration::days(i64::from(retention_days));
        let purged = self.incoming.purge_processed(before).await?;
        if purged > 0 {
            info!(purged, %before, "Purged processed incoming webhooks");
        }
        Ok(purged)
    }
}

/// Parse the body as JSON, falling back to a JSON string. U+0000 is
/// removed from every string and key since Postgres text and jsonb reject it.
fn parse_payload(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    match serde_json::from_slice(body) {
        Ok(value) => strip_nul_value(value),
        Err(_) => Value::String(strip_nul(&String::from_utf8_lossy(body))),
    }
}

fn strip_nul(text: &str) -> String {
    text.replace('\0', "")
}

fn strip_nul_value(value: Value) -> Value {
    match value {
        Value::String(s) if s.contains('\0') => Value::String(strip_nul(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nul_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (strip_nul(&key), strip_nul_value(value)))
                .collect(),
        ),
        other => other,
    }
}

fn normalize_source(source: &str) -> String {
    let source: String = strip_nul(source.trim())
        .chars()
        .take(MAX_SOURCE_LEN)
        .collect();
    if source.is_empty() {
        "unknown".to_string()
    } else {
        source
    }
}

fn infer_event_type(headers: &[(String, String)], payload: &Value) -> Option<String> {
    let from_header = EVENT_TYPE_HEADERS.iter().find_map(|wanted| {
        headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value.trim().to_string())
    });
    from_header
        .or_else(|| {
            EVENT_TYPE_FIELDS
                .iter()
                .find_map(|field| payload.get(field)?.as_str().map(str::to_string))
        })
        .filter(|t| !t.is_empty())
}

/// Lowercase header names into a JSON object, joining repeated headers and
/// redacting credentials.
pub fn redact_headers(headers: &[(String, String)]) -> Value {
    let mut out = Map::new();
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        let value = if REDACTED_HEADERS.contains(&name.as_str()) {
            REDACTED.to_string()
        } else {
            strip_nul(value)
        };
        match out.get_mut(&name) {
            Some(Value::String(existing)) if value != REDACTED => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Some(_) => {}
            None => {
                out.insert(name, Value::String(value));
            }
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use complyhub_core::ErrorKind;
    use complyhub_database::Stores;
    use complyhub_entity::user::Role;

    use super::*;
    use crate::testing::{ctx, rbac};

    fn service() -> IncomingLogService {
        IncomingLogService::new(Stores::memory().incoming, rbac())
    }

    fn request(body: &str) -> IncomingRequest {
        IncomingRequest {
            source: "gas-contractor".into(),
            event_type: None,
            body: body.as_bytes().to_vec(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Authorization".into(), "Bearer secret".into()),
                ("Cookie".into(), "session=abc".into()),
                ("X-API-Key".into(), "chk_key".into()),
            ],
        }
    }

    #[tokio::test]
    async fn test_ingest_redacts_and_infers_event_type() {
        let svc = service();
        let entry = svc
            .ingest(request(r#"{"type":"job.completed","job":7}"#))
            .await
            .unwrap();

        assert_eq!(entry.event_type.as_deref(), Some("job.completed"));
        assert_eq!(entry.payload["job"], 7);
        assert_eq!(entry.headers["authorization"], REDACTED);
        assert_eq!(entry.headers["cookie"], REDACTED);
        assert_eq!(entry.headers["x-api-key"], REDACTED);
        assert_eq!(entry.headers["content-type"], "application/json");
        assert!(!entry.processed);
    }

    #[tokio::test]
    async fn test_ingest_keeps_invalid_json_as_string() {
        let svc = service();
        let entry = svc.ingest(request("not json at all")).await.unwrap();
        assert_eq!(entry.payload, json!("not json at all"));
        assert!(entry.event_type.is_none());
    }

    #[tokio::test]
    async fn test_ingest_removes_nul_characters() {
        let svc = service();
        let mut raw = request("");
        raw.body = b"a\0b".to_vec();
        let entry = svc.ingest(raw).await.unwrap();
        assert_eq!(entry.payload, json!("ab"));

        let mut req = request(r#"{"k\u0000ey":["x\u0000y"],"type":"job\u0000.done"}"#);
        req.source = "gas\0contractor".into();
        let entry = svc.ingest(req).await.unwrap();
        assert_eq!(entry.payload, json!({"key": ["xy"], "type": "job.done"}));
        assert_eq!(entry.event_type.as_deref(), Some("job.done"));
        assert_eq!(entry.source, "gascontractor");
        assert!(!entry.payload.to_string().contains("\\u0000"));
    }

    #[tokio::test]
    async fn test_header_event_type_wins_over_payload() {
        let svc = service();
        let mut req = request(r#"{"type":"from.body"}"#);
        req.headers.push(("X-Event-Type".into(), "from.header".into()));
        let entry = svc.ingest(req).await.unwrap();
        assert_eq!(entry.event_type.as_deref(), Some("from.header"));
    }

    #[tokio::test]
    async fn test_processed_after_created_and_clears_error() {
        let svc = service();
        let manager = ctx(Role::Manager);
        let entry = svc.ingest(request("{}")).await.unwrap();

        let failed = svc.mark_failed(&manager, entry.id, "unknown job").await.unwrap();
        assert!(!failed.processed);
        assert_eq!(failed.error_message.as_deref(), Some("unknown job"));

        let processed = svc.mark_processed(&manager, entry.id).await.unwrap();
        assert!(processed.processed);
        assert!(processed.error_message.is_none());
        assert!(processed.processed_at.unwrap() >= processed.created_at);

        let again = svc.mark_processed(&manager, entry.id).await.unwrap();
        assert_eq!(again.processed_at, processed.processed_at);

        let err = svc.mark_failed(&manager, entry.id, "late").await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn test_replay_requires_capability() {
        let svc = service();
        let entry = svc.ingest(request("{}")).await.unwrap();
        let err = svc
            .mark_processed(&ctx(Role::Officer), entry.id)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Authorization));
    }

    #[tokio::test]
    async fn test_list_unprocessed_and_purge() {
        let svc = service();
        let manager = ctx(Role::Manager);
        let done = svc.ingest(request("{}")).await.unwrap();
        svc.ingest(request("{}")).await.unwrap();
        svc.mark_processed(&manager, done.id).await.unwrap();

        let queue = svc
            .list_unprocessed(&manager, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(queue.total_items, 1);

        assert_eq!(svc.purge_processed(30).await.unwrap(), 0);
        assert_eq!(svc.purge_processed(0).await.unwrap(), 1);
    }

    #[test]
    fn test_redact_joins_repeated_headers() {
        let headers = vec![
            ("Accept".to_string(), "a".to_string()),
            ("accept".to_string(), "b".to_string()),
        ];
        assert_eq!(redact_headers(&headers)["accept"], "a, b");
    }
}
