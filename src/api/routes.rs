//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use std::any::Any;

use axum::{response::IntoResponse, response::Response, routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use super::handlers::{
    forecast_handler, health_handler, raw_handler, stats_handler, weather_handler, AppState,
};
use crate::error::ProxyError;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Liveness check
/// - `GET /weather` - Forecast for latitude/longitude (aliases lat/lon/long)
/// - `GET /forecast` - Forward to the upstream path named by `endpoint`
/// - `GET /raw/*subpath` - Forward any upstream path verbatim
/// - `GET /stats` - Cache statistics
///
/// # Middleware
/// - Catch panic: converts handler panics into a 500 error body
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/health", get(health_handler))
        .route("/weather", get(weather_handler))
        .route("/forecast", get(forecast_handler))
        .route("/raw/*subpath", get(raw_handler))
        .route("/stats", get(stats_handler))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(detail = %detail, "Internal server error");
    ProxyError::Internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::proxy::Forwarder;
    use crate::upstream::{RetryPolicy, UpstreamClient};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let client = UpstreamClient::new(
            "http://127.0.0.1:9",
            Duration::from_secs(1),
            RetryPolicy::new(1, Duration::ZERO),
        )
        .unwrap();
        let forwarder = Forwarder::new(client, CacheStore::new(10, Duration::from_secs(60)));
        create_router(AppState::new(forwarder))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_weather_without_coordinates() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/weather").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let response = panic_response(Box::new("exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "internal_server_error");
        assert_eq!(json["detail"], "exploded");
    }
}
