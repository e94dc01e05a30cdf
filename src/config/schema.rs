//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the media proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host, port, fallback ports).
    pub listener: ListenerConfig,

    /// Public API surface.
    pub api: ApiConfig,

    /// Media origin fetch settings.
    pub upstream: UpstreamConfig,

    /// External extraction service.
    pub extractor: ExtractorConfig,

    /// Scratch download directory.
    pub downloads: DownloadsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Preferred port.
    pub port: u16,

    /// How many successive ports to try when the preferred one is taken.
    pub port_retries: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            port_retries: 5,
        }
    }
}

/// API surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Path prefix the media routes are mounted under.
    pub prefix: String,

    /// Allow any origin, method and header.
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api/meta".to_string(),
            cors_enabled: true,
        }
    }
}

/// Upstream media fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Default User-Agent sent to media origins.
    pub user_agent: String,

    /// Default Referer sent to media origins.
    pub referer: String,

    /// Redirect hops followed before giving up.
    pub max_redirects: usize,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Honor HTTP(S)_PROXY environment variables.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            referer: "https://www.facebook.com/".to_string(),
            max_redirects: 5,
            connect_timeout_secs: 10,
            use_system_proxy: true,
        }
    }
}

/// Extraction service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Endpoint called as `GET <endpoint>?url=<post url>`.
    pub endpoint: Option<String>,

    /// Total request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

/// Scratch download directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Directory purged after every file download.
    pub dir: PathBuf,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("downloads"),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time a media origin gets to send headers and the first body chunk,
    /// in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
