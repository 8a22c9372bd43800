//! Custom handler HTTP host
//!
//! The Functions host forwards the trigger's request unchanged, so the
//! router serves the same path the function is published under.

use super::handler::CustomerLookupHandler;
use super::protocol::{LookupRequest, ResponseEnvelope};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Path of the HTTP trigger
pub const TRIGGER_ROUTE: &str = "/api/HttpTrigger1";

/// Build the router for the custom handler
pub fn create_router(handler: Arc<CustomerLookupHandler>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(TRIGGER_ROUTE, get(get_customer).post(get_customer))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

async fn health() -> &'static str {
    "OK"
}

async fn get_customer(
    State(handler): State<Arc<CustomerLookupHandler>>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Bytes,
) -> ResponseEnvelope {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed query string");
            HashMap::new()
        }
    };

    let request = LookupRequest::from_parts(&query, &body);
    handler.handle(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::function::handler::tests::{spawn_d365, FakeCredential};
    use crate::test_support::unused_address;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn create_test_router(base_url: &str, credential: Arc<FakeCredential>) -> Router {
        let config = Config::from_lookup(|key| match key {
            "D365_API_BASEURL" => Some(base_url.to_string()),
            _ => None,
        })
        .unwrap();
        create_router(Arc::new(CustomerLookupHandler::new(&config, credential)))
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint_returns_ok() {
        let app = create_test_router(&unused_address().await, FakeCredential::token("t"));

        let request = Request::builder()
            .uri("/health")
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_without_id_returns_400() {
        let app = create_test_router(&unused_address().await, FakeCredential::token("t"));

        let request = Request::builder()
            .uri(TRIGGER_ROUTE)
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "missing id" }));
    }

    #[tokio::test]
    async fn test_get_with_query_id() {
        let base = spawn_d365().await;
        let app = create_test_router(&base, FakeCredential::token("test-token"));

        let request = Request::builder()
            .uri(format!("{}?id=ABC123", TRIGGER_ROUTE))
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "value": [{ "AccountNumber": "ABC123", "dataAreaId": "usmf" }] })
        );
    }

    #[tokio::test]
    async fn test_post_with_json_body() {
        let base = spawn_d365().await;
        let app = create_test_router(&base, FakeCredential::token("test-token"));

        let request = Request::builder()
            .uri(TRIGGER_ROUTE)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"id":"ABC123"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["value"][0]["AccountNumber"], "ABC123");
    }

    #[tokio::test]
    async fn test_post_query_id_wins() {
        let base = spawn_d365().await;
        let app = create_test_router(&base, FakeCredential::token("test-token"));

        let request = Request::builder()
            .uri(format!("{}?id=ZZZ", TRIGGER_ROUTE))
            .method("POST")
            .body(Body::from(r#"{"id":"ABC123"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["value"][0]["AccountNumber"], "OTHER");
    }

    #[tokio::test]
    async fn test_repeated_query_id_uses_last() {
        let base = spawn_d365().await;
        let app = create_test_router(&base, FakeCredential::token("test-token"));

        let request = Request::builder()
            .uri(format!("{}?id=ZZZ&id=ABC123", TRIGGER_ROUTE))
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["value"][0]["AccountNumber"], "ABC123");
    }

    #[tokio::test]
    async fn test_post_invalid_json_returns_400() {
        let app = create_test_router(&unused_address().await, FakeCredential::token("t"));

        let request = Request::builder()
            .uri(TRIGGER_ROUTE)
            .method("POST")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_token_failure_returns_502() {
        let app = create_test_router(
            &unused_address().await,
            FakeCredential::failing("no identity"),
        );

        let request = Request::builder()
            .uri(format!("{}?id=ABC123", TRIGGER_ROUTE))
            .method("GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "upstream error", "details": "Token request failed: no identity" })
        );
    }
}
