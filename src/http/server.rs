//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, CORS, panics)
//! - Answer unknown paths and methods with the JSON 404 envelope
//! - Mount media routes under the configured prefix
//! - Serve on a listener until shutdown

use axum::{
    body::Body,
    http::{Request, Response},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::validation::validate_config;
use crate::config::{ConfigError, ProxyConfig};
use crate::extractor::{ExtractError, HttpExtractor, MediaExtractor};
use crate::http::handlers;
use crate::http::request::X_REQUEST_ID;
use crate::http::response::ApiError;
use crate::media::HeaderDefaults;
use crate::scratch::ScratchDir;
use crate::upstream::{UpstreamClient, UpstreamError};

/// Errors that can occur while assembling the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Extractor(#[from] ExtractError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
    pub extractor: Arc<dyn MediaExtractor>,
    pub scratch: ScratchDir,
    pub header_defaults: HeaderDefaults,
    pub prefix: String,
    /// Budget for an upstream to produce headers and its first body chunk.
    pub head_timeout: Duration,
}

/// HTTP server for the media proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server using the HTTP extraction client from the config.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let extractor = Arc::new(HttpExtractor::new(&config.extractor)?);
        Self::with_extractor(config, extractor)
    }

    /// Create a server with a caller-supplied extractor.
    ///
    /// The config is validated here too, since it may not come from a file.
    pub fn with_extractor(
        config: ProxyConfig,
        extractor: Arc<dyn MediaExtractor>,
    ) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let state = AppState {
            upstream: UpstreamClient::new(&config.upstream)?,
            extractor,
            scratch: ScratchDir::new(config.downloads.dir.clone()),
            header_defaults: HeaderDefaults::from(&config.upstream),
            prefix: normalize_prefix(&config.api.prefix),
            head_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/download", get(handlers::download))
            .route("/file", get(handlers::file))
            .route("/stream", get(handlers::stream))
            .method_not_allowed_fallback(handlers::not_found);

        let mut router = Router::new()
            .route("/", get(handlers::index))
            .nest(&state.prefix, api)
            .fallback(handlers::not_found)
            .method_not_allowed_fallback(handlers::not_found)
            .with_state(state)
            .layer(CatchPanicLayer::custom(handle_panic));

        if config.api.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    // Path only: query strings carry media tokens.
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
        )
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.api.prefix,
            scratch_dir = %self.config.downloads.dir.display(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    format!("/{}", prefix.trim_matches('/'))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(error = detail, "Handler panicked");

    ApiError::Internal.into_response()
}
