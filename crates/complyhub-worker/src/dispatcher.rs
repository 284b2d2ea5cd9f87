//! Outbound delivery: builds the signed request for one delivery and turns
//! the response into an [`AttemptOutcome`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Response};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::debug;

use complyhub_core::AppError;
use complyhub_core::config::WebhookConfig;
use complyhub_database::store::ClaimedDelivery;
use complyhub_entity::webhook::{AttemptOutcome, WebhookAuthType, WebhookEndpoint, WebhookEvent};

/// Event type header.
pub const HEADER_EVENT: &str = "X-Webhook-Event";
/// Delivery id header.
pub const HEADER_DELIVERY: &str = "X-Webhook-Delivery";
/// 1-based attempt number header.
pub const HEADER_ATTEMPT: &str = "X-Webhook-Attempt";
/// Unix timestamp covered by the signature.
pub const HEADER_TIMESTAMP: &str = "X-Webhook-Timestamp";
/// `sha256=<hex>` HMAC signature header.
pub const HEADER_SIGNATURE: &str = "X-Webhook-Signature";
/// Credential header for `BEARER` and `BASIC` endpoints.
pub const HEADER_AUTHORIZATION: &str = "Authorization";
/// API key header for `API_KEY` endpoints.
pub const HEADER_API_KEY: &str = "X-API-Key";

/// Why a dispatch did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No response within the endpoint timeout.
    #[error("Request timed out after {0} ms")]
    Timeout(u128),

    /// Connection, TLS or protocol failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status.
    #[error("Endpoint responded with HTTP {0}")]
    Status(u16),

    /// The request could not be signed or encoded.
    #[error("Request preparation failed: {0}")]
    Prepare(String),
}

/// Something that can perform one delivery attempt.
#[async_trait]
pub trait DeliverySender: Send + Sync + std::fmt::Debug + 'static {
    /// Attempt the delivery. Never fails; failures are outcomes.
    async fn send(&self, claimed: &ClaimedDelivery) -> AttemptOutcome;
}

/// HTTP dispatcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    /// Shared connection pool.
    client: Client,
    /// Longest response body kept.
    max_response_body_bytes: usize,
    /// `User-Agent` sent with every request.
    user_agent: String,
}

impl WebhookDispatcher {
    /// Creates a dispatcher from the `[webhooks]` configuration.
    pub fn new(config: &WebhookConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_response_body_bytes: config.max_response_body_bytes,
            user_agent: format!("ComplyHub-Webhooks/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    async fn post(
        &self,
        claimed: &ClaimedDelivery,
        started: Instant,
    ) -> Result<(u16, Option<String>), (DispatchError, Option<u16>, Option<String>)> {
        let endpoint = &claimed.endpoint;
        let body = serde_json::to_vec(&outbound_body(&claimed.event))
            .map_err(|e| (DispatchError::Prepare(e.to_string()), None, None))?;
        let auth = auth_headers(endpoint, Utc::now().timestamp(), &body)
            .map_err(|e| (e, None, None))?;

        let mut request = self
            .client
            .post(&endpoint.url)
            .timeout(endpoint.timeout())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .header(HEADER_EVENT, &claimed.event.event_type)
            .header(HEADER_DELIVERY, claimed.delivery.id.to_string())
            .header(HEADER_ATTEMPT, (claimed.delivery.attempt_count + 1).to_string());
        for (name, value) in auth {
            request = request.header(name, value);
        }

        let response = request.body(body).send().await.map_err(|e| {
            let err = if e.is_timeout() {
                DispatchError::Timeout(started.elapsed().as_millis())
            } else {
                DispatchError::Transport(e.to_string())
            };
            (err, None, None)
        })?;

        let status = response.status();
        let text = read_capped(response, self.max_response_body_bytes).await;
        if status.is_success() {
            Ok((status.as_u16(), text))
        } else {
            Err((DispatchError::Status(status.as_u16()), Some(status.as_u16()), text))
        }
    }
}

#[async_trait]
impl DeliverySender for WebhookDispatcher {
    async fn send(&self, claimed: &ClaimedDelivery) -> AttemptOutcome {
        let started = Instant::now();
        let result = self.post(claimed, started).await;
        let duration_ms = elapsed_ms(started.elapsed());

        debug!(
            delivery_id = %claimed.delivery.id,
            url = %claimed.endpoint.url,
            duration_ms,
            ok = result.is_ok(),
            "Webhook dispatched"
        );

        match result {
            Ok((status, body)) => AttemptOutcome::Success {
                response_status: i32::from(status),
                response_body: body,
                duration_ms,
            },
            Err((err, status, body)) => AttemptOutcome::Failure {
                response_status: status.map(i32::from),
                response_body: body,
                duration_ms: Some(duration_ms),
                error_message: err.to_string(),
            },
        }
    }
}

/// JSON body posted to subscribers.
pub fn outbound_body(event: &WebhookEvent) -> Value {
    json!({
        "id": event.id,
        "event_type": event.event_type,
        "entity_type": event.entity_type,
        "entity_id": event.entity_id,
        "organisation_id": event.organisation_id,
        "created_at": event.created_at,
        "payload": event.payload,
    })
}

/// Authentication headers for `endpoint`, given the exact body bytes.
pub fn auth_headers(
    endpoint: &WebhookEndpoint,
    timestamp: i64,
    body: &[u8],
) -> Result<Vec<(&'static str, String)>, DispatchError> {
    let value = endpoint.auth_value.as_deref().unwrap_or_default();
    let headers = match endpoint.auth_type {
        WebhookAuthType::None => Vec::new(),
        WebhookAuthType::Bearer => vec![(HEADER_AUTHORIZATION, format!("Bearer {value}"))],
        WebhookAuthType::Basic => vec![(
            HEADER_AUTHORIZATION,
            format!("Basic {}", BASE64.encode(value)),
        )],
        WebhookAuthType::ApiKey => vec![(HEADER_API_KEY, value.to_string())],
        WebhookAuthType::HmacSha256 => vec![
            (HEADER_TIMESTAMP, timestamp.to_string()),
            (HEADER_SIGNATURE, signature(value, timestamp, body)?),
        ],
    };
    Ok(headers)
}

/// `sha256=` followed by the hex HMAC-SHA256 of `"<timestamp>.<body>"`.
pub fn signature(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, DispatchError> {
    let mut message = format!("{timestamp}.").into_bytes();
    message.extend_from_slice(body);
    Ok(format!("sha256={}", hmac_hex(secret.as_bytes(), &message)?))
}

fn hmac_hex(key: &[u8], message: &[u8]) -> Result<String, DispatchError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| DispatchError::Prepare(format!("invalid signing key: {e}")))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Read at most `max_bytes` of the body and drop the rest unread.
async fn read_capped(mut response: Response, max_bytes: usize) -> Option<String> {
    let mut buf = Vec::new();
    while buf.len() < max_bytes {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = max_bytes - buf.len();
                buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "Response body read failed");
                break;
            }
        }
    }
    if buf.is_empty() {
        return None;
    }
    Some(truncate(String::from_utf8_lossy(&buf).into_owned(), max_bytes))
}

fn truncate(mut text: String, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let mut cut = max_bytes;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

fn elapsed_ms(elapsed: Duration) -> i64 {
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use chrono::Utc;
    use uuid::Uuid;

    use complyhub_entity::webhook::{EndpointStatus, WebhookDelivery};

    use super::*;

    fn endpoint(url: &str, auth_type: WebhookAuthType, auth_value: Option<&str>) -> WebhookEndpoint {
        let now = Utc::now();
        WebhookEndpoint {
            id: Uuid::new_v4(),
            organisation_id: Uuid::new_v4(),
            name: "test".into(),
            url: url.into(),
            auth_type,
            auth_value: auth_value.map(str::to_string),
            events: vec!["*".into()],
            status: EndpointStatus::Active,
            retry_count: 3,
            timeout_ms: 2_000,
            failure_count: 0,
            last_success_at: None,
            last_failure_at: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn claimed(endpoint: WebhookEndpoint) -> ClaimedDelivery {
        let now = Utc::now();
        let event = WebhookEvent {
            id: Uuid::new_v4(),
            organisation_id: endpoint.organisation_id,
            event_type: "action.created".into(),
            entity_type: "remedial_action".into(),
            entity_id: "a-1".into(),
            payload: json!({"title": "Replace smoke alarm"}),
            processed: true,
            processed_at: Some(now),
            created_at: now,
        };
        ClaimedDelivery {
            delivery: WebhookDelivery::pending(endpoint.id, event.id, now),
            endpoint,
            event,
        }
    }

    #[test]
    fn test_hmac_matches_rfc4231_vector() {
        let mac = hmac_hex(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            mac,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signature_covers_timestamp_and_body() {
        let body = br#"{"id":1}"#;
        let sig = signature("secret", 1_700_000_000, body).unwrap();
        let expected = hmac_hex(b"secret", br#"1700000000.{"id":1}"#).unwrap();
        assert_eq!(sig, format!("sha256={expected}"));
        assert_ne!(sig, signature("secret", 1_700_000_001, body).unwrap());
    }

    #[test]
    fn test_auth_headers_per_type() {
        let url = "https://example.com";
        let none = auth_headers(&endpoint(url, WebhookAuthType::None, None), 0, b"").unwrap();
        assert!(none.is_empty());

        let bearer =
            auth_headers(&endpoint(url, WebhookAuthType::Bearer, Some("tok")), 0, b"").unwrap();
        assert_eq!(bearer, vec![(HEADER_AUTHORIZATION, "Bearer tok".to_string())]);

        let basic =
            auth_headers(&endpoint(url, WebhookAuthType::Basic, Some("user:pass")), 0, b"")
                .unwrap();
        assert_eq!(
            basic,
            vec![(HEADER_AUTHORIZATION, "Basic dXNlcjpwYXNz".to_string())]
        );

        let key = auth_headers(&endpoint(url, WebhookAuthType::ApiKey, Some("k")), 0, b"").unwrap();
        assert_eq!(key, vec![(HEADER_API_KEY, "k".to_string())]);

        let hmac =
            auth_headers(&endpoint(url, WebhookAuthType::HmacSha256, Some("s")), 42, b"{}")
                .unwrap();
        assert_eq!(hmac[0], (HEADER_TIMESTAMP, "42".to_string()));
        assert!(hmac[1].1.starts_with("sha256="));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo".into(), 2), "h");
        assert_eq!(truncate("short".into(), 100), "short");
    }

    #[test]
    fn test_outbound_body_shape() {
        let claimed = claimed(endpoint("https://example.com", WebhookAuthType::None, None));
        let body = outbound_body(&claimed.event);
        assert_eq!(body["event_type"], "action.created");
        assert_eq!(body["entity_id"], "a-1");
        assert_eq!(body["payload"]["title"], "Replace smoke alarm");
        assert_eq!(body["organisation_id"], json!(claimed.event.organisation_id));
    }

    async fn serve(status: StatusCode, seen: Arc<Mutex<Option<(HeaderMap, String)>>>) -> String {
        let app = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, body: String| {
                let seen = seen.clone();
                async move {
                    *seen.lock().unwrap() = Some((headers, body));
                    (status, "x".repeat(4096))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    #[tokio::test]
    async fn test_dispatch_success_is_signed() {
        let seen = Arc::new(Mutex::new(None));
        let url = serve(StatusCode::OK, seen.clone()).await;
        let dispatcher = WebhookDispatcher::new(&WebhookConfig::default()).unwrap();
        let claimed = claimed(endpoint(&url, WebhookAuthType::HmacSha256, Some("s3cret")));

        match dispatcher.send(&claimed).await {
            AttemptOutcome::Success {
                response_status,
                response_body,
                ..
            } => {
                assert_eq!(response_status, 200);
                assert_eq!(response_body.unwrap().len(), 2048);
            }
            other => panic!("expected success, got {other:?}"),
        }

        let (headers, body) = seen.lock().unwrap().take().unwrap();
        let ts: i64 = headers[HEADER_TIMESTAMP].to_str().unwrap().parse().unwrap();
        let expected = signature("s3cret", ts, body.as_bytes()).unwrap();
        assert_eq!(headers[HEADER_SIGNATURE].to_str().unwrap(), expected);
        assert_eq!(headers[HEADER_EVENT], "action.created");
        assert_eq!(headers[HEADER_ATTEMPT], "1");
        assert_eq!(
            headers[HEADER_DELIVERY].to_str().unwrap(),
            claimed.delivery.id.to_string()
        );
        assert!(headers["user-agent"].to_str().unwrap().starts_with("ComplyHub-Webhooks/"));
    }

    #[tokio::test]
    async fn test_large_response_body_is_capped() {
        let app = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::BAD_GATEWAY, "é".repeat(500_000)) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = WebhookConfig {
            max_response_body_bytes: 5,
            ..WebhookConfig::default()
        };
        let dispatcher = WebhookDispatcher::new(&config).unwrap();
        let url = format!("http://{addr}/hook");

        match dispatcher
            .send(&claimed(endpoint(&url, WebhookAuthType::None, None)))
            .await
        {
            AttemptOutcome::Failure {
                response_status,
                response_body,
                ..
            } => {
                assert_eq!(response_status, Some(502));
                assert_eq!(response_body.as_deref(), Some("éé"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_non_2xx_is_failure() {
        let seen = Arc::new(Mutex::new(None));
        let url = serve(StatusCode::SERVICE_UNAVAILABLE, seen).await;
        let dispatcher = WebhookDispatcher::new(&WebhookConfig::default()).unwrap();

        let outcome = dispatcher
            .send(&claimed(endpoint(&url, WebhookAuthType::None, None)))
            .await;
        match outcome {
            AttemptOutcome::Failure {
                response_status,
                error_message,
                ..
            } => {
                assert_eq!(response_status, Some(503));
                assert_eq!(error_message, "Endpoint responded with HTTP 503");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_connection_refused_is_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dispatcher = WebhookDispatcher::new(&WebhookConfig::default()).unwrap();
        let outcome = dispatcher
            .send(&claimed(endpoint(
                &format!("http://{addr}/hook"),
                WebhookAuthType::None,
                None,
            )))
            .await;
        match outcome {
            AttemptOutcome::Failure {
                response_status, ..
            } => assert!(response_status.is_none()),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
