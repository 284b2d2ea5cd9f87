//! `GET /api/openapi.json`: a hand-maintained OpenAPI 3 description of the
//! routes in [`crate::router`].

use axum::Json;
use serde_json::{Map, Value, json};

/// One documented operation: method, path, tag, summary and the capability
/// it requires (`None` for public routes, `Some("")` for any caller).
type Operation = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    Option<&'static str>,
);

const OPERATIONS: &[Operation] = &[
    ("get", "/api/health", "health", "Liveness probe", None),
    ("get", "/api/health/detailed", "health", "Readiness with database status", None),
    ("get", "/api/openapi.json", "health", "This document", None),
    ("post", "/api/auth/sign-up/email", "auth", "Create an organisation and its admin", None),
    ("post", "/api/auth/sign-in/email", "auth", "Exchange email and password for a token", None),
    ("get", "/api/auth/me", "auth", "Current caller", Some("")),
    ("get", "/api/api-keys", "api-keys", "List API keys", Some("manage_api_keys")),
    ("post", "/api/api-keys", "api-keys", "Create an API key", Some("manage_api_keys")),
    ("delete", "/api/api-keys/{id}", "api-keys", "Revoke an API key", Some("manage_api_keys")),
    ("get", "/api/webhooks/endpoints", "webhooks", "List endpoints", Some("view_webhooks")),
    ("post", "/api/webhooks/endpoints", "webhooks", "Register an endpoint", Some("manage_webhooks")),
    ("get", "/api/webhooks/endpoints/{id}", "webhooks", "Get an endpoint", Some("view_webhooks")),
    ("patch", "/api/webhooks/endpoints/{id}", "webhooks", "Update an endpoint", Some("manage_webhooks")),
    ("delete", "/api/webhooks/endpoints/{id}", "webhooks", "Disable an endpoint", Some("manage_webhooks")),
    ("post", "/api/webhooks/endpoints/{id}/suspend", "webhooks", "Pause deliveries", Some("manage_webhooks")),
    ("post", "/api/webhooks/endpoints/{id}/resume", "webhooks", "Reactivate and reset failures", Some("manage_webhooks")),
    ("get", "/api/webhooks/endpoints/{id}/deliveries", "webhooks", "Deliveries to an endpoint", Some("view_webhooks")),
    ("get", "/api/webhooks/events", "webhooks", "List events", Some("view_webhooks")),
    ("post", "/api/webhooks/events", "webhooks", "Record an event", Some("manage_webhooks")),
    ("get", "/api/webhooks/events/{id}", "webhooks", "Get an event", Some("view_webhooks")),
    ("get", "/api/webhooks/events/{id}/deliveries", "webhooks", "Deliveries of an event", Some("view_webhooks")),
    ("post", "/api/webhooks/events/{id}/fan-out", "webhooks", "Schedule deliveries now", Some("manage_webhooks")),
    ("get", "/api/webhooks/deliveries/stats", "webhooks", "Delivery counts per status", Some("view_webhooks")),
    ("get", "/api/webhooks/deliveries/{id}", "webhooks", "Get a delivery", Some("view_webhooks")),
    ("post", "/api/webhooks/incoming/{source}", "incoming", "Receive an inbound webhook (202)", None),
    ("get", "/api/webhooks/incoming", "incoming", "List inbound webhooks", Some("replay_incoming")),
    ("post", "/api/webhooks/incoming/{id}/processed", "incoming", "Mark processed", Some("replay_incoming")),
    ("post", "/api/webhooks/incoming/{id}/failed", "incoming", "Record a processing failure", Some("replay_incoming")),
    ("get", "/api/actions", "actions", "List remedial actions", Some("view_actions")),
    ("post", "/api/actions", "actions", "Raise a remedial action", Some("manage_actions")),
    ("get", "/api/actions/{id}", "actions", "Get a remedial action", Some("view_actions")),
    ("patch", "/api/actions/{id}", "actions", "Move to another status", Some("manage_actions")),
    ("post", "/api/actions/{id}/advance", "actions", "Move to the next status", Some("manage_actions")),
    ("get", "/api/knowledge", "knowledge", "Search articles", Some("view_knowledge")),
    ("post", "/api/knowledge", "knowledge", "Create an article", Some("manage_knowledge")),
    ("get", "/api/knowledge/{id}", "knowledge", "Get an article", Some("view_knowledge")),
    ("put", "/api/knowledge/{id}", "knowledge", "Replace an article", Some("manage_knowledge")),
    ("delete", "/api/knowledge/{id}", "knowledge", "Delete an article", Some("manage_knowledge")),
];

/// GET /api/openapi.json
pub async fn openapi_document() -> Json<Value> {
    Json(build_document())
}

/// Assemble the document from [`OPERATIONS`].
pub fn build_document() -> Value {
    let mut paths = Map::new();
    for (method, path, tag, summary, capability) in OPERATIONS {
        let mut operation = json!({
            "tags": [tag],
            "summary": summary,
            "responses": {
                "200": { "description": "Success envelope" },
                "default": { "$ref": "#/components/responses/Error" }
            }
        });
        if let Some(capability) = capability {
            operation["security"] = json!([{ "bearerAuth": [] }, { "apiKeyAuth": [] }]);
            if !capability.is_empty() {
                operation["x-required-capability"] = json!(capability);
            }
        }
        let parameters = path_parameters(path);
        if !parameters.is_empty() {
            operation["parameters"] = Value::Array(parameters);
        }

        if let Value::Object(item) = paths
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            item.insert(method.to_string(), operation);
        }
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "ComplyHub API",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": paths,
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer" },
                "apiKeyAuth": { "type": "apiKey", "in": "header", "name": "X-API-Key" }
            },
            "responses": {
                "Error": {
                    "description": "Error envelope",
                    "content": { "application/json": { "schema": {
                        "type": "object",
                        "required": ["error", "message"],
                        "properties": {
                            "error": { "type": "string" },
                            "message": { "type": "string" }
                        }
                    }}}
                }
            }
        }
    })
}

fn path_parameters(path: &str) -> Vec<Value> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operation_is_listed() {
        let doc = build_document();
        let paths = doc["paths"].as_object().expect("paths");
        let count: usize = paths
            .values()
            .map(|item| item.as_object().map_or(0, |m| m.len()))
            .sum();
        assert_eq!(count, OPERATIONS.len());
    }

    #[test]
    fn test_path_parameters_extracted() {
        let doc = build_document();
        let params = &doc["paths"]["/api/webhooks/endpoints/{id}/deliveries"]["get"]["parameters"];
        assert_eq!(params[0]["name"], "id");
        assert!(doc["paths"]["/api/health"]["get"].get("security").is_none());
    }
}
