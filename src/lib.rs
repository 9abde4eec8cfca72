//! Weather Proxy - A caching reverse proxy for the Open-Meteo API
//!
//! Forwards GET requests upstream with retry on transient failures and caches
//! the results (failures included) for a short TTL.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use error::ProxyError;
pub use proxy::Forwarder;
pub use tasks::spawn_cleanup_task;
