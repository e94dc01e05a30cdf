//! Upstream media fetching.
//!
//! # Design Decisions
//! - One shared reqwest client, redirect hops capped (5 by default)
//! - Non-success statuses are errors; callers never relay an origin error page
//! - Bodies are never buffered here, the response is handed back unread
//! - No total timeout, only a connect timeout: media bodies can be long

pub mod client;

pub use client::{UpstreamClient, UpstreamError};
