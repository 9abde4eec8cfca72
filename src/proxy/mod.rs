//! Proxy Module
//!
//! Composes the upstream client and the response cache.

mod forwarder;

pub use forwarder::Forwarder;
