//! API Module
//!
//! HTTP handlers and routing for the proxy.
//!
//! # Endpoints
//! - `GET /health` - Liveness check
//! - `GET /weather` - Forecast by coordinates
//! - `GET /forecast` - Forecast or another upstream endpoint via `endpoint`
//! - `GET /raw/*subpath` - Any upstream path
//! - `GET /stats` - Cache statistics

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
