//! Upstream Result Module
//!
//! The status-plus-payload pair produced by every upstream call.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ProxyError;

// == Payload ==
/// Response body, either parsed JSON or the raw text upstream sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Parses `body` as JSON, keeping the raw text when it is not JSON.
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(body),
        }
    }

    /// Converts the payload into a JSON value, wrapping text as a string.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
        }
    }
}

// == Upstream Result ==
/// Outcome of a forwarded request.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResult {
    /// HTTP status relayed to the caller
    pub status: u16,
    /// Body relayed to the caller
    pub payload: Payload,
    /// Whether this result describes a failure
    pub is_error: bool,
}

impl UpstreamResult {
    /// Successful upstream response.
    pub fn success(status: u16, payload: Payload) -> Self {
        Self {
            status,
            payload,
            is_error: false,
        }
    }

    /// Synthetic result standing in for a terminal upstream failure.
    pub fn from_error(err: &ProxyError) -> Self {
        Self {
            status: err.status_code().as_u16(),
            payload: Payload::Json(err.body()),
            is_error: true,
        }
    }
}

impl IntoResponse for UpstreamResult {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        match self.payload {
            Payload::Json(value) => (status, Json(value)).into_response(),
            Payload::Text(text) => (status, text).into_response(),
        }
    }
}
