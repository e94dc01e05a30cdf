//! HTTP-backed extraction collaborator.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use url::Url;

use crate::config::ExtractorConfig;
use crate::extractor::{ExtractError, MediaExtractor};

/// Calls `GET <endpoint>?url=<post url>` on an extraction service.
#[derive(Debug, Clone)]
pub struct HttpExtractor {
    http: reqwest::Client,
    endpoint: Option<Url>,
}

impl HttpExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| ExtractError::InvalidResponse(format!("invalid endpoint: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ExtractError::Request)?;

        if endpoint.is_none() {
            tracing::warn!("No extraction endpoint configured; /download will fail");
        }

        Ok(Self { http, endpoint })
    }

    async fn call(&self, post_url: String) -> Result<Value, ExtractError> {
        let endpoint = self.endpoint.as_ref().ok_or(ExtractError::NotConfigured)?;

        let response = self
            .http
            .get(endpoint.clone())
            .query(&[("url", post_url.as_str())])
            .send()
            .await
            .map_err(ExtractError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ExtractError::InvalidResponse(e.to_string()))
    }
}

impl MediaExtractor for HttpExtractor {
    fn extract(&self, post_url: &str) -> BoxFuture<'_, Result<Value, ExtractError>> {
        self.call(post_url.to_string()).boxed()
    }
}
