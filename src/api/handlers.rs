//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint. Forwarding handlers only
//! normalize `(path, params)` and relay the forwarder's result.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::models::{
    normalize_weather_params, split_endpoint, HealthResponse, StatsResponse, DEFAULT_ENDPOINT,
};
use crate::proxy::Forwarder;
use crate::upstream::UpstreamResult;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-or-fetch coordinator
    pub forwarder: Arc<Forwarder>,
}

impl AppState {
    /// Creates a new AppState around the given forwarder.
    pub fn new(forwarder: Forwarder) -> Self {
        Self {
            forwarder: Arc::new(forwarder),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Forwarder::from_config(config)?))
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handler for GET /weather
///
/// Requires latitude/longitude (or lat/lon/long) and forwards to `forecast`.
pub async fn weather_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<UpstreamResult> {
    let params = normalize_weather_params(params)?;
    Ok(state.forwarder.forward(DEFAULT_ENDPOINT, &params).await)
}

/// Handler for GET /forecast
///
/// The optional `endpoint` parameter selects the upstream path.
pub async fn forecast_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> UpstreamResult {
    let (endpoint, params) = split_endpoint(params);
    state.forwarder.forward(&endpoint, &params).await
}

/// Handler for GET /raw/*subpath
pub async fn raw_handler(
    State(state): State<AppState>,
    Path(subpath): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> UpstreamResult {
    state.forwarder.forward(&subpath, &params).await
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.forwarder.stats().await.into())
}
