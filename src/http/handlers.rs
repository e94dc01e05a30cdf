//! API handlers.
//!
//! - `GET /`              service index
//! - `GET {prefix}/download` delegate a post URL to the extractor
//! - `GET {prefix}/file`     stream media as an attachment
//! - `GET {prefix}/stream`   stream media inline for playback

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tokio::time::timeout_at;

use crate::http::body::relay;
use crate::http::request::{non_empty, DownloadQuery, FileQuery, StreamQuery};
use crate::http::response::{ApiError, Success, DOWNLOAD_FAILED, SEND_FAILED, STREAM_FAILED};
use crate::http::server::AppState;
use crate::media::MediaRequest;
use crate::observability::metrics;
use crate::scratch::CleanupGuard;

const OCTET_STREAM: &str = "application/octet-stream";

/// An absent query string deserializes to all-`None`; a malformed one (for
/// example a repeated parameter) is answered with `invalid`.
fn parse_query<T>(query: Result<Query<T>, QueryRejection>, invalid: ApiError) -> Result<T, ApiError> {
    query.map(|Query(q)| q).map_err(|e| {
        tracing::debug!(error = %e, "Rejected query string");
        invalid
    })
}

/// Await an upstream step, giving up at `deadline`.
async fn by_deadline<T, E: Display>(
    deadline: tokio::time::Instant,
    step: impl Future<Output = Result<T, E>>,
) -> Result<T, String> {
    match timeout_at(deadline, step).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("timed out waiting for upstream".to_string()),
    }
}

/// Copy selected headers from the upstream response. Content-Type falls back
/// to `application/octet-stream`.
fn propagate(upstream: &HeaderMap, names: &[header::HeaderName]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in names {
        if let Some(value) = upstream.get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    }
    headers
}

fn finish(route: &'static str, start: Instant, result: Result<Response, ApiError>) -> Response {
    let response = result.unwrap_or_else(IntoResponse::into_response);
    metrics::record_request(route, response.status().as_u16(), start);
    response
}

/// Service index.
pub async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Media proxy API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [state.prefix.as_str()],
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// `GET /download?url=<post url>`
pub async fn download(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Response {
    let start = Instant::now();
    let result: Result<Response, ApiError> = async {
        let query = parse_query(query, ApiError::InvalidParam("url"))?;
        let url = non_empty(query.url).ok_or(ApiError::MissingParam("url"))?;

        match state.extractor.extract(&url).await {
            Ok(data) => Ok(Success::new(data).into_response()),
            Err(e) => {
                tracing::warn!(error = %e, "Extraction failed");
                Err(ApiError::Extraction(e.to_string()))
            }
        }
    }
    .await;
    finish("download", start, result)
}

/// `GET /file?mediaUrl=<url>&filename=<name>`
pub async fn file(
    State(state): State<AppState>,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> Response {
    let start = Instant::now();
    let result = match parse_query(query, ApiError::InvalidMediaUrl) {
        Ok(query) => serve_file(&state, query).await,
        Err(e) => Err(e),
    };
    finish("file", start, result)
}

async fn serve_file(state: &AppState, query: FileQuery) -> Result<Response, ApiError> {
    let raw = non_empty(query.media_url).ok_or(ApiError::MissingParam("mediaUrl"))?;
    let media = MediaRequest::new(&raw, non_empty(query.filename))
        .map_err(|_| ApiError::InvalidMediaUrl)?;
    let filename = media.attachment_filename();

    tracing::debug!(host = media.host(), filename = %filename, "Fetching media for download");

    let deadline = tokio::time::Instant::now() + state.head_timeout;
    let upstream = by_deadline(
        deadline,
        state
            .upstream
            .fetch(media.resolved_url(), media.upstream_headers(&state.header_defaults)),
    )
    .await
    .map_err(|e| {
        tracing::warn!(host = media.host(), error = %e, "Media download failed");
        ApiError::Upstream(DOWNLOAD_FAILED)
    })?;

    let mut headers = propagate(
        upstream.headers(),
        &[header::CONTENT_TYPE, header::CONTENT_LENGTH],
    );
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|_| ApiError::Internal)?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    let scratch = state.scratch.clone();
    let cleanup = CleanupGuard::new(move || scratch.purge_detached());

    let body = by_deadline(deadline, relay(upstream, "file", Some(cleanup)))
        .await
        .map_err(|e| {
            tracing::warn!(host = media.host(), error = %e, "Media body failed before first byte");
            ApiError::Upstream(SEND_FAILED)
        })?;

    Ok(with_headers(body, headers))
}

/// `GET /stream?mediaUrl=<url>`
///
/// Keeps the fetch server-side so browsers can play media the origin
/// refuses to serve cross-origin.
pub async fn stream(
    State(state): State<AppState>,
    query: Result<Query<StreamQuery>, QueryRejection>,
) -> Response {
    let start = Instant::now();
    let result = match parse_query(query, ApiError::Upstream(STREAM_FAILED)) {
        Ok(query) => serve_stream(&state, query).await,
        Err(e) => Err(e),
    };
    finish("stream", start, result)
}

async fn serve_stream(state: &AppState, query: StreamQuery) -> Result<Response, ApiError> {
    let raw = non_empty(query.media_url).ok_or(ApiError::MissingParam("mediaUrl"))?;
    let media = MediaRequest::new(&raw, None).map_err(|_| ApiError::Upstream(STREAM_FAILED))?;

    let deadline = tokio::time::Instant::now() + state.head_timeout;
    let upstream = by_deadline(
        deadline,
        state
            .upstream
            .fetch(media.resolved_url(), media.upstream_headers(&state.header_defaults)),
    )
    .await
    .map_err(|e| {
        tracing::warn!(host = media.host(), error = %e, "Media stream failed");
        ApiError::Upstream(STREAM_FAILED)
    })?;

    let headers = propagate(
        upstream.headers(),
        &[header::CONTENT_TYPE, header::CONTENT_LENGTH, header::ACCEPT_RANGES],
    );

    let body = by_deadline(deadline, relay(upstream, "stream", None))
        .await
        .map_err(|e| {
            tracing::warn!(host = media.host(), error = %e, "Media stream failed before first byte");
            ApiError::Upstream(STREAM_FAILED)
        })?;

    Ok(with_headers(body, headers))
}

fn with_headers(body: Body, headers: HeaderMap) -> Response {
    let mut response = Response::new(body);
    *response.headers_mut() = headers;
    response
}
