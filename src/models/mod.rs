//! Request and Response models for the proxy API
//!
//! Query normalization for forwarded routes and the DTOs of the proxy's own
//! endpoints.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{normalize_weather_params, split_endpoint, DEFAULT_ENDPOINT};
pub use responses::{HealthResponse, StatsResponse};
