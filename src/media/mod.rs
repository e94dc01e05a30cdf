//! Media URL handling.
//!
//! # Data Flow
//! ```text
//! mediaUrl query parameter
//!     → resolver.rs (provider rewrite hook, identity today)
//!     → token.rs (decode header hints from ?token=)
//!     → headers.rs (defaults + raw token headers + resolved token headers)
//!     → filename.rs (attachment name for /file)
//!     → MediaRequest handed to the upstream fetch
//! ```

pub mod filename;
pub mod headers;
pub mod resolver;
pub mod token;

pub use filename::{attachment_filename, sanitize};
pub use headers::{build_headers, HeaderDefaults};
pub use resolver::resolve_media_url;
pub use token::extract_headers;

use reqwest::header::HeaderMap;
use url::Url;

/// One media fetch, fixed at construction.
#[derive(Debug, Clone)]
pub struct MediaRequest {
    raw_url: String,
    resolved_url: Url,
    desired_filename: Option<String>,
}

impl MediaRequest {
    /// Resolve and parse `raw_url`.
    pub fn new(raw_url: &str, desired_filename: Option<String>) -> Result<Self, url::ParseError> {
        let resolved_url = Url::parse(&resolve_media_url(raw_url))?;
        Ok(Self {
            raw_url: raw_url.to_string(),
            resolved_url,
            desired_filename: desired_filename.filter(|name| !name.is_empty()),
        })
    }

    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    pub fn resolved_url(&self) -> &Url {
        &self.resolved_url
    }

    pub fn desired_filename(&self) -> Option<&str> {
        self.desired_filename.as_deref()
    }

    /// Headers for the upstream fetch.
    pub fn upstream_headers(&self, defaults: &HeaderDefaults) -> HeaderMap {
        build_headers(defaults, &self.raw_url, self.resolved_url.as_str())
    }

    /// Name for `Content-Disposition: attachment`.
    pub fn attachment_filename(&self) -> String {
        attachment_filename(self.desired_filename(), &self.resolved_url)
    }

    /// Host of the resolved URL, safe to log.
    pub fn host(&self) -> &str {
        self.resolved_url.host_str().unwrap_or("-")
    }
}
