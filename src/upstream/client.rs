//! HTTP client for media origins.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use reqwest::{Response, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;

/// Errors that can occur while opening an upstream media response.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Client construction failed.
    #[error("failed to build upstream client: {0}")]
    Build(#[source] reqwest::Error),

    /// DNS, connect, TLS, redirect or transport failure.
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Origin answered with a non-success status.
    #[error("upstream returned {0}")]
    Status(StatusCode),
}

/// Client used for every media fetch.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Build a client following at most `max_redirects` hops.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(UpstreamError::Build)?;
        Ok(Self { http })
    }

    /// Issue a GET and return the response once its head has arrived.
    ///
    /// The body is left unread so the caller can stream it.
    pub async fn fetch(&self, url: &Url, headers: HeaderMap) -> Result<Response, UpstreamError> {
        let response = self
            .http
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(UpstreamError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }
        Ok(response)
    }
}
