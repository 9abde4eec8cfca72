//! Error types for the weather proxy
//!
//! Provides unified error handling using thiserror. Every variant maps to an
//! HTTP status and a `{ "error", "detail" }` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for the proxy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    /// Required request parameters are absent
    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    /// Network failure or retries exhausted on a transient status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Upstream answered with a non-retryable, non-success status
    #[error("Upstream returned {status}: {detail}")]
    UpstreamHttp { status: u16, detail: Value },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Machine-readable error code used in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::MissingParameters(_) => "missing_parameters",
            ProxyError::Upstream(_) => "upstream_error",
            ProxyError::UpstreamHttp { .. } => "upstream_http_error",
            ProxyError::Internal(_) => "internal_server_error",
        }
    }

    /// HTTP status the error is surfaced with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameters(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamHttp { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured body: `{ "error": code, "detail": ... }`.
    pub fn body(&self) -> Value {
        let detail = match self {
            ProxyError::MissingParameters(msg)
            | ProxyError::Upstream(msg)
            | ProxyError::Internal(msg) => Value::String(msg.clone()),
            ProxyError::UpstreamHttp { detail, .. } => detail.clone(),
        };

        json!({
            "error": self.code(),
            "detail": detail
        })
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
