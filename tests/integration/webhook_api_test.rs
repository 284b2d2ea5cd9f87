//! Integration tests for the webhook API: endpoints, events, fan-out and
//! the incoming log.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_register_and_get_endpoint() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("ops@lettings.example").await;

    let id = app
        .register_endpoint(&admin, &["certificate.*", "action.created"])
        .await;

    let response = app
        .request(
            "GET",
            &format!("/api/webhooks/endpoints/{id}"),
            None,
            Some(&admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let endpoint = response.data();
    assert_eq!(endpoint["status"], "ACTIVE");
    assert_eq!(endpoint["retry_count"], 3);
    assert_eq!(endpoint["timeout_ms"], 30_000);
    assert_eq!(endpoint["failure_count"], 0);
    assert_eq!(endpoint["organisation_id"], admin.organisation_id.as_str());
    assert!(endpoint.get("auth_value").is_none());
}

#[tokio::test]
async fn test_register_rejects_empty_events() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("empty@lettings.example").await;

    let response = app
        .request(
            "POST",
            "/api/webhooks/endpoints",
            Some(json!({
                "name": "Nothing",
                "url": "https://hooks.example.com/none",
                "events": [],
            })),
            Some(&admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION");
}

#[tokio::test]
async fn test_requires_credentials() {
    let app = helpers::TestApp::new();

    let response = app
        .request("GET", "/api/webhooks/endpoints", None, None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTHENTICATION");
}

#[tokio::test]
async fn test_viewer_key_reads_but_cannot_register() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("keys@lettings.example").await;
    app.register_endpoint(&admin, &["*"]).await;
    let viewer_key = app.api_key(&admin, "VIEWER").await;

    let headers = [("x-api-key", viewer_key.clone())];
    let list = app
        .raw_request("GET", "/api/webhooks/endpoints", &headers, Vec::new())
        .await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.data()["total_items"], 1);

    let register = app
        .request(
            "POST",
            "/api/webhooks/endpoints",
            Some(json!({
                "name": "Sneaky",
                "url": "https://hooks.example.com/sneaky",
                "events": ["*"],
            })),
            Some(&viewer_key),
        )
        .await;
    assert_eq!(register.status, StatusCode::FORBIDDEN);
    assert_eq!(register.error_code(), "AUTHORIZATION");
}

#[tokio::test]
async fn test_other_organisation_sees_not_found() {
    let app = helpers::TestApp::new();
    let owner = app.sign_up("owner@lettings.example").await;
    let stranger = app.sign_up("stranger@agency.example").await;
    let id = app.register_endpoint(&owner, &["*"]).await;

    let response = app
        .request(
            "GET",
            &format!("/api/webhooks/endpoints/{id}"),
            None,
            Some(&stranger.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_suspend_resume_and_disable() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("lifecycle@lettings.example").await;
    let id = app.register_endpoint(&admin, &["*"]).await;

    let suspended = app
        .request(
            "POST",
            &format!("/api/webhooks/endpoints/{id}/suspend"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(suspended.status, StatusCode::OK);
    assert_eq!(suspended.data()["status"], "PAUSED");

    let resumed = app
        .request(
            "POST",
            &format!("/api/webhooks/endpoints/{id}/resume"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(resumed.data()["status"], "ACTIVE");

    let disabled = app
        .request(
            "DELETE",
            &format!("/api/webhooks/endpoints/{id}"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(disabled.status, StatusCode::OK);
    assert_eq!(disabled.data()["status"], "DISABLED");

    let patched = app
        .request(
            "PATCH",
            &format!("/api/webhooks/endpoints/{id}"),
            Some(json!({ "name": "Renamed" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(patched.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_fan_out_creates_one_delivery_per_subscriber() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("fanout@lettings.example").await;
    let subscribed = app.register_endpoint(&admin, &["certificate.*"]).await;
    app.register_endpoint(&admin, &["action.created"]).await;

    let recorded = app
        .request(
            "POST",
            "/api/webhooks/events",
            Some(json!({
                "event_type": "certificate.expired",
                "entity_type": "certificate",
                "entity_id": "gas-safety-42",
                "payload": { "property": "12 Acacia Avenue" },
            })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(recorded.status, StatusCode::CREATED);
    assert_eq!(recorded.data()["processed"], false);
    let event_id = recorded.data()["id"].as_str().expect("event id").to_string();

    let fan_out = app
        .request(
            "POST",
            &format!("/api/webhooks/events/{event_id}/fan-out"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(fan_out.status, StatusCode::OK);
    assert_eq!(fan_out.data()["created"], 1);

    let again = app
        .request(
            "POST",
            &format!("/api/webhooks/events/{event_id}/fan-out"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(again.data()["created"], 0);

    let deliveries = app
        .request(
            "GET",
            &format!("/api/webhooks/events/{event_id}/deliveries"),
            None,
            Some(&admin.token),
        )
        .await;
    let rows = deliveries.data().as_array().expect("deliveries");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["webhook_endpoint_id"], subscribed.as_str());
    assert_eq!(rows[0]["status"], "PENDING");
    assert_eq!(rows[0]["attempt_count"], 0);

    let event = app
        .request(
            "GET",
            &format!("/api/webhooks/events/{event_id}"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(event.data()["processed"], true);

    let stats = app
        .request(
            "GET",
            "/api/webhooks/deliveries/stats",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(stats.data()["pending"], 1);
    assert_eq!(stats.data()["sent"], 0);
}

#[tokio::test]
async fn test_incoming_always_accepted_and_redacted() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("inbound@lettings.example").await;

    let headers = [
        ("content-type", "text/plain".to_string()),
        ("authorization", "Bearer partner-secret".to_string()),
        ("x-event-type", "job.completed".to_string()),
    ];
    let received = app
        .raw_request(
            "POST",
            "/api/webhooks/incoming/contractor-portal",
            &headers,
            b"not json at all".to_vec(),
        )
        .await;
    assert_eq!(received.status, StatusCode::ACCEPTED);
    assert_eq!(received.data()["received"], true);
    let log_id = received.data()["id"].as_str().expect("log id").to_string();

    let listed = app
        .request(
            "GET",
            "/api/webhooks/incoming?processed=false",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    let entry = &listed.data()["items"][0];
    assert_eq!(entry["source"], "contractor-portal");
    assert_eq!(entry["event_type"], "job.completed");
    assert_eq!(entry["payload"], "not json at all");
    assert_eq!(entry["headers"]["authorization"], "[REDACTED]");

    let processed = app
        .request(
            "POST",
            &format!("/api/webhooks/incoming/{log_id}/processed"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(processed.status, StatusCode::OK);
    assert_eq!(processed.data()["processed"], true);
    assert!(processed.data()["processed_at"].is_string());

    let failed = app
        .request(
            "POST",
            &format!("/api/webhooks/incoming/{log_id}/failed"),
            Some(json!({ "error_message": "too late" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(failed.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_incoming_accepted_with_unusual_query_strings() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("query@lettings.example").await;
    let headers = [("content-type", "application/json".to_string())];

    for path in [
        "/api/webhooks/incoming/contractor?event_type=a&event_type=b",
        "/api/webhooks/incoming/contractor?event_type=%zz&x=%E0%A4%A",
        "/api/webhooks/incoming/contractor?=&&event_type",
    ] {
        let received = app
            .raw_request("POST", path, &headers, br#"{"x":1}"#.to_vec())
            .await;
        assert_eq!(received.status, StatusCode::ACCEPTED, "{path}");
    }

    let listed = app
        .request(
            "GET",
            "/api/webhooks/incoming?source=contractor",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(listed.data()["total_items"], 3);
    let event_types: Vec<&str> = listed.data()["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|entry| entry["event_type"].as_str())
        .collect();
    assert!(event_types.contains(&"a"));
}
