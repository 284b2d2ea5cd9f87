//! Shared test helpers for integration tests.
//!
//! Every `TestApp` runs the full router over fresh in-memory stores, so the
//! tests need no database.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use complyhub_api::{AppState, build_app};
use complyhub_core::config::AppConfig;
use complyhub_database::Stores;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for driving services the HTTP API does not expose
    pub state: AppState,
}

/// A signed-up organisation admin.
pub struct Admin {
    /// Bearer token
    pub token: String,
    /// Organisation id
    pub organisation_id: String,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let config = AppConfig::default();
        let state = AppState::new(config.clone(), Stores::memory(), None);
        let router = build_app(state.clone(), &config.server.cors);
        Self { router, state }
    }

    /// Sign up a new organisation and return its admin.
    pub async fn sign_up(&self, email: &str) -> Admin {
        let response = self
            .request(
                "POST",
                "/api/auth/sign-up/email",
                Some(json!({
                    "name": "Test Admin",
                    "email": email,
                    "password": "correct-horse-battery",
                    "organisationName": "Test Lettings",
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        Admin {
            token: response.body["data"]["token"]["access_token"]
                .as_str()
                .expect("token")
                .to_string(),
            organisation_id: response.body["data"]["user"]["organisation_id"]
                .as_str()
                .expect("organisation id")
                .to_string(),
        }
    }

    /// Create an API key with `role` and return the raw key.
    pub async fn api_key(&self, admin: &Admin, role: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/api-keys",
                Some(json!({ "name": format!("{role} key"), "role": role })),
                Some(&admin.token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"]["raw_key"]
            .as_str()
            .expect("raw key")
            .to_string()
    }

    /// Register an endpoint subscribed to `events` and return its id.
    pub async fn register_endpoint(&self, admin: &Admin, events: &[&str]) -> String {
        let response = self
            .request(
                "POST",
                "/api/webhooks/endpoints",
                Some(json!({
                    "name": "Contractor portal",
                    "url": "https://hooks.example.com/complyhub",
                    "events": events,
                })),
                Some(&admin.token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"]["id"]
            .as_str()
            .expect("endpoint id")
            .to_string()
    }

    /// Make a JSON request with an optional bearer token.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut headers = vec![("content-type", "application/json".to_string())];
        if let Some(token) = token {
            headers.push(("authorization", format!("Bearer {token}")));
        }
        let body = body
            .map(|b| serde_json::to_vec(&b).expect("Failed to serialize body"))
            .unwrap_or_default();
        self.raw_request(method, path, &headers, body).await
    }

    /// Make a request with arbitrary headers and body bytes.
    pub async fn raw_request(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, String)],
        body: Vec<u8>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }
        let req = req.body(Body::from(body)).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of an error body.
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
