//! Extraction collaborator.
//!
//! Turning a post URL into media URLs is delegated to an external scraping
//! service. The proxy treats the result as opaque JSON.

pub mod client;

pub use client::HttpExtractor;

use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by an extractor. The message reaches the API caller.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Extraction service is not configured.")]
    NotConfigured,

    #[error("Extraction request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Extraction service returned {0}")]
    Status(StatusCode),

    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Failed(String),
}

/// Resolves a social-media post URL into media metadata.
pub trait MediaExtractor: Send + Sync {
    fn extract(&self, post_url: &str) -> BoxFuture<'_, Result<Value, ExtractError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;

    #[tokio::test]
    async fn test_unconfigured_extractor_fails() {
        let extractor = HttpExtractor::new(&ExtractorConfig::default()).unwrap();
        let err = extractor.extract("https://www.instagram.com/p/abc/").await.unwrap_err();
        assert!(matches!(err, ExtractError::NotConfigured));
        assert_eq!(err.to_string(), "Extraction service is not configured.");
    }
}
