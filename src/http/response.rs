//! JSON response envelope and API errors.
//!
//! # Design Decisions
//! - Every error is `{"success": false, "error": "<message>"}`
//! - Upstream failures carry a fixed message; origin URLs and headers are
//!   never echoed back to the caller
//! - Client input errors map to 400, unknown routes to 404, the rest to 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message for `/file` when the upstream fetch fails.
pub const DOWNLOAD_FAILED: &str = "Failed to download media.";
/// Message for `/file` when the upstream body fails before any byte is sent.
pub const SEND_FAILED: &str = "Failed to send file.";
/// Message for `/stream` on any upstream failure.
pub const STREAM_FAILED: &str = "Failed to stream media.";

/// Successful envelope.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Error envelope body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing '{0}' query parameter.")]
    MissingParam(&'static str),

    #[error("Invalid '{0}' query parameter.")]
    InvalidParam(&'static str),

    #[error("Invalid mediaUrl.")]
    InvalidMediaUrl,

    /// Upstream failure, reported with a fixed per-route message.
    #[error("{0}")]
    Upstream(&'static str),

    #[error("{0}")]
    Extraction(String),

    #[error("Endpoint not found")]
    NotFound,

    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParam(_) | ApiError::InvalidParam(_) | ApiError::InvalidMediaUrl => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Extraction(_) | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
