//! Integration tests for the remedial action workflow.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

async fn create_action(app: &helpers::TestApp, token: &str) -> String {
    let response = app
        .request(
            "POST",
            "/api/actions",
            Some(json!({
                "title": "Replace consumer unit",
                "severity": "URGENT",
                "due_date": "2026-11-30",
            })),
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.data()["status"], "OPEN");
    response.data()["id"].as_str().expect("action id").to_string()
}

#[tokio::test]
async fn test_patch_follows_the_kanban() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("kanban@lettings.example").await;
    let id = create_action(&app, &admin.token).await;
    let path = format!("/api/actions/{id}");

    let started = app
        .request(
            "PATCH",
            &path,
            Some(json!({ "status": "IN_PROGRESS" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(started.status, StatusCode::OK);
    assert_eq!(started.data()["status"], "IN_PROGRESS");

    let backwards = app
        .request(
            "PATCH",
            &path,
            Some(json!({ "status": "OPEN" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(backwards.status, StatusCode::BAD_REQUEST);
    assert_eq!(backwards.error_code(), "VALIDATION");

    let advanced = app
        .request(
            "POST",
            &format!("{path}/advance"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(advanced.data()["status"], "SCHEDULED");

    let completed = app
        .request(
            "PATCH",
            &path,
            Some(json!({ "status": "COMPLETED" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(completed.data()["status"], "COMPLETED");
    assert!(completed.data()["completed_at"].is_string());

    for target in ["CANCELLED", "OPEN", "IN_PROGRESS"] {
        let response = app
            .request(
                "PATCH",
                &path,
                Some(json!({ "status": target })),
                Some(&admin.token),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{target}");
    }

    let terminal = app
        .request(
            "POST",
            &format!("{path}/advance"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(terminal.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_from_open() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("cancel@lettings.example").await;
    let id = create_action(&app, &admin.token).await;

    let cancelled = app
        .request(
            "PATCH",
            &format!("/api/actions/{id}"),
            Some(json!({ "status": "CANCELLED" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.data()["status"], "CANCELLED");
    assert!(cancelled.data()["completed_at"].is_null());
}

#[tokio::test]
async fn test_changes_are_recorded_as_events() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("events@lettings.example").await;
    let id = create_action(&app, &admin.token).await;
    app.request(
        "PATCH",
        &format!("/api/actions/{id}"),
        Some(json!({ "status": "IN_PROGRESS" })),
        Some(&admin.token),
    )
    .await;

    let created = app
        .request(
            "GET",
            "/api/webhooks/events?event_type=action.created",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(created.data()["total_items"], 1);
    assert_eq!(created.data()["items"][0]["entity_id"], id.as_str());

    let changed = app
        .request(
            "GET",
            "/api/webhooks/events?event_type=action.status_changed",
            None,
            Some(&admin.token),
        )
        .await;
    let event = &changed.data()["items"][0];
    assert_eq!(event["payload"]["from"], "OPEN");
    assert_eq!(event["payload"]["to"], "IN_PROGRESS");
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("filters@lettings.example").await;
    let first = create_action(&app, &admin.token).await;
    create_action(&app, &admin.token).await;
    app.request(
        "POST",
        &format!("/api/actions/{first}/advance"),
        None,
        Some(&admin.token),
    )
    .await;

    let open = app
        .request(
            "GET",
            "/api/actions?status=OPEN",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(open.status, StatusCode::OK);
    assert_eq!(open.data()["total_items"], 1);

    let all = app
        .request("GET", "/api/actions?per_page=1", None, Some(&admin.token))
        .await;
    assert_eq!(all.data()["total_items"], 2);
    assert_eq!(all.data()["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(all.data()["has_next"], true);
}

#[tokio::test]
async fn test_officer_moves_actions_viewer_does_not() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("roles@lettings.example").await;
    let officer = app.api_key(&admin, "OFFICER").await;
    let viewer = app.api_key(&admin, "VIEWER").await;

    let id = create_action(&app, &officer).await;

    let denied = app
        .request(
            "PATCH",
            &format!("/api/actions/{id}"),
            Some(json!({ "status": "IN_PROGRESS" })),
            Some(&viewer),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let visible = app
        .request("GET", &format!("/api/actions/{id}"), None, Some(&viewer))
        .await;
    assert_eq!(visible.status, StatusCode::OK);

    let endpoints = app
        .request(
            "POST",
            "/api/webhooks/endpoints",
            Some(json!({
                "name": "Officer hook",
                "url": "https://hooks.example.com/officer",
                "events": ["*"],
            })),
            Some(&officer),
        )
        .await;
    assert_eq!(endpoints.status, StatusCode::FORBIDDEN);
}
