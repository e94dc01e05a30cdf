//! Request parameters and identification.
//!
//! # Design Decisions
//! - Request ID (UUID v4) is assigned as early as possible and echoed back
//! - Query parameters are all optional at the type level; handlers decide
//!   which are required so the error envelope stays uniform
//! - Empty values count as missing

use axum::http::HeaderName;
use serde::Deserialize;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// `GET /download` query.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
}

/// `GET /file` query.
#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(rename = "mediaUrl")]
    pub media_url: Option<String>,
    pub filename: Option<String>,
}

/// `GET /stream` query.
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(rename = "mediaUrl")]
    pub media_url: Option<String>,
}

/// Treat an empty parameter as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
