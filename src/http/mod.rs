//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, CORS, JSON fallbacks)
//!     → request.rs (query parameters)
//!     → handlers.rs (validate, build MediaRequest, fetch upstream)
//!     → body.rs (relay upstream bytes, fire cleanup once)
//!     → response.rs (JSON envelope for every error)
//!     → Send to client
//! ```

pub mod body;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer, ServerError};
