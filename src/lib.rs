//! Media Proxy Library
//!
//! Resolves social-media post URLs through an extraction service and relays
//! the resulting media to callers, replaying header hints embedded in signed
//! media tokens.

pub mod config;
pub mod extractor;
pub mod http;
pub mod lifecycle;
pub mod media;
pub mod observability;
pub mod scratch;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
