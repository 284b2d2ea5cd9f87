//! Integration tests for sign-up, sign-in, API keys and the public routes.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_sign_up_then_sign_in() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("first@lettings.example").await;
    assert!(!admin.token.is_empty());

    let signed_in = app
        .request(
            "POST",
            "/api/auth/sign-in/email",
            Some(json!({
                "email": "first@lettings.example",
                "password": "correct-horse-battery",
            })),
            None,
        )
        .await;
    assert_eq!(signed_in.status, StatusCode::OK);
    assert_eq!(signed_in.data()["user"]["role"], "ADMIN");
    assert!(signed_in.data()["user"].get("password_hash").is_none());
    assert!(signed_in.data()["token"]["access_token"].is_string());
}

#[tokio::test]
async fn test_sign_up_rejections() {
    let app = helpers::TestApp::new();
    app.sign_up("taken@lettings.example").await;

    let duplicate = app
        .request(
            "POST",
            "/api/auth/sign-up/email",
            Some(json!({
                "name": "Second",
                "email": "taken@lettings.example",
                "password": "another-long-password",
            })),
            None,
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let short = app
        .request(
            "POST",
            "/api/auth/sign-up/email",
            Some(json!({
                "name": "Short",
                "email": "short@lettings.example",
                "password": "short",
            })),
            None,
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.error_code(), "VALIDATION");

    let bad_email = app
        .request(
            "POST",
            "/api/auth/sign-up/email",
            Some(json!({
                "name": "Bad",
                "email": "not-an-email",
                "password": "correct-horse-battery",
            })),
            None,
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = helpers::TestApp::new();
    app.sign_up("wrong@lettings.example").await;

    let response = app
        .request(
            "POST",
            "/api/auth/sign-in/email",
            Some(json!({
                "email": "wrong@lettings.example",
                "password": "not-the-password",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTHENTICATION");
}

#[tokio::test]
async fn test_me_lists_capabilities() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("me@lettings.example").await;

    let response = app
        .request("GET", "/api/auth/me", None, Some(&admin.token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["user"]["email"], "me@lettings.example");
    let capabilities = response.data()["capabilities"]
        .as_array()
        .expect("capabilities");
    assert!(capabilities.contains(&json!("manage_api_keys")));
    assert!(response.data()["api_key_id"].is_null());

    let garbage = app
        .request("GET", "/api/auth/me", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_key_lifecycle() {
    let app = helpers::TestApp::new();
    let admin = app.sign_up("keys@lettings.example").await;
    let raw_key = app.api_key(&admin, "MANAGER").await;
    assert!(raw_key.starts_with("chk_"));

    let me = app
        .raw_request(
            "GET",
            "/api/auth/me",
            &[("x-api-key", raw_key.clone())],
            Vec::new(),
        )
        .await;
    assert_eq!(me.status, StatusCode::OK);
    let capabilities = me.data()["capabilities"].as_array().expect("capabilities");
    assert!(capabilities.contains(&json!("manage_webhooks")));
    assert!(!capabilities.contains(&json!("manage_api_keys")));
    let key_id = me.data()["api_key_id"]
        .as_str()
        .expect("api key id")
        .to_string();

    let by_bearer = app
        .request("GET", "/api/auth/me", None, Some(&raw_key))
        .await;
    assert_eq!(by_bearer.status, StatusCode::OK);

    let forbidden = app
        .request("GET", "/api/api-keys", None, Some(&raw_key))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let listed = app
        .request("GET", "/api/api-keys", None, Some(&admin.token))
        .await;
    let keys = listed.data().as_array().expect("keys");
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["role"], "MANAGER");
    assert!(keys[0].get("key_hash").is_none());
    assert!(keys[0].get("raw_key").is_none());

    let revoked = app
        .request(
            "DELETE",
            &format!("/api/api-keys/{key_id}"),
            None,
            Some(&admin.token),
        )
        .await;
    assert_eq!(revoked.status, StatusCode::OK);
    assert!(revoked.data()["revoked_at"].is_string());

    let after = app
        .raw_request(
            "GET",
            "/api/auth/me",
            &[("x-api-key", raw_key)],
            Vec::new(),
        )
        .await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_routes() {
    let app = helpers::TestApp::new();

    let health = app.request("GET", "/api/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.data()["status"], "ok");

    let detailed = app
        .request("GET", "/api/health/detailed", None, None)
        .await;
    assert_eq!(detailed.data()["database"], "in_memory");

    let openapi = app.request("GET", "/api/openapi.json", None, None).await;
    assert_eq!(openapi.status, StatusCode::OK);
    assert_eq!(openapi.body["openapi"], "3.0.3");
    assert!(openapi.body["paths"]["/api/actions/{id}/advance"]["post"].is_object());
}
