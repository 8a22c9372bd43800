//! Trigger request and response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Inbound lookup request: the `id` query parameter and the parsed JSON body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupRequest {
    pub query_id: Option<String>,
    pub body: Option<Value>,
}

impl LookupRequest {
    pub fn new(query_id: Option<&str>, body: Option<Value>) -> Self {
        Self {
            query_id: query_id.map(String::from),
            body,
        }
    }

    /// Build from decoded query parameters and the raw request body
    ///
    /// A body that is empty or not JSON is treated as absent. When the query
    /// string repeats `id`, the extractor keeps the last occurrence.
    pub fn from_parts(query: &HashMap<String, String>, body: &[u8]) -> Self {
        let body = if body.is_empty() {
            None
        } else {
            serde_json::from_slice::<Value>(body).ok()
        };

        Self {
            query_id: query.get("id").cloned(),
            body,
        }
    }

    /// Customer id from the query, falling back to the body's `id` field
    ///
    /// Empty strings, `null`, `false` and zero count as missing. Any other
    /// body value is rendered the way a JavaScript template literal would.
    pub fn customer_id(&self) -> Option<String> {
        if let Some(id) = self.query_id.as_deref().filter(|id| !id.is_empty()) {
            return Some(id.to_string());
        }

        let id = self.body.as_ref()?.get("id")?;
        is_truthy(id).then(|| js_string(id))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn js_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            // f64 Display drops a zero fraction: 1.0 -> "1"
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(js_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// JSON error body: `{"error": ..., "details": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Status code plus JSON body returned to the Functions host
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub body: Value,
}

impl ResponseEnvelope {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, body: ErrorBody) -> Self {
        Self {
            status,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}
