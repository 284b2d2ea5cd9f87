//! Integration tests for the knowledge base.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_article_crud() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("kb@lettings.example").await;

    let created = app
        .request(
            "POST",
            "/api/knowledge",
            Some(json!({
                "title": "EICR observation codes",
                "content": "C1 means danger present.",
                "category": "Electrical",
                "tags": ["EICR", "eicr", "codes"],
            })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.data()["category"], "electrical");
    assert_eq!(created.data()["tags"], json!(["eicr", "codes"]));
    let id = created.data()["id"].as_str().expect("article id").to_string();
    let path = format!("/api/knowledge/{id}");

    let updated = app
        .request(
            "PUT",
            &path,
            Some(json!({ "title": "EICR codes explained" })),
            Some(&admin.token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.data()["title"], "EICR codes explained");
    assert_eq!(updated.data()["category"], "general");

    let deleted = app
        .request("DELETE", &path, None, Some(&admin.token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.data()["deleted"], true);

    let gone = app.request("GET", &path, None, Some(&admin.token)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_and_category_filter() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("search@lettings.example").await;

    for (title, category) in [
        ("Gas safety record retention", "gas"),
        ("Smoke alarm placement", "fire"),
        ("Carbon monoxide alarms", "gas"),
    ] {
        let response = app
            .request(
                "POST",
                "/api/knowledge",
                Some(json!({ "title": title, "category": category })),
                Some(&admin.token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let gas = app
        .request(
            "GET",
            "/api/knowledge?category=GAS",
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(gas.data()["total_items"], 2);

    let alarms = app
        .request("GET", "/api/knowledge?q=alarm", None, Some(&admin.token))
        .await;
    assert_eq!(alarms.data()["total_items"], 2);
}

#[tokio::test]
async fn test_blank_title_rejected() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("blank@lettings.example").await;

    let response = app
        .request(
            "POST",
            "/api/knowledge",
            Some(json!({ "title": "" })),
            Some(&admin.token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION");
}
