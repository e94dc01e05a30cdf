//! Streaming relay of upstream bodies.
//!
//! The upstream body is forwarded chunk by chunk. The first chunk is pulled
//! before the response head is committed so that an immediately failing
//! upstream can still be answered with a JSON error. After that, a stream
//! error aborts the client connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

use crate::observability::metrics;
use crate::scratch::CleanupGuard;

type ChunkResult = Result<Bytes, reqwest::Error>;

/// Upstream body stream with completion tracking.
///
/// On end of stream, or when dropped early because the client disconnected,
/// the optional [`CleanupGuard`] is finalized. The guard runs once either way.
pub struct RelayStream {
    inner: BoxStream<'static, ChunkResult>,
    route: &'static str,
    bytes: u64,
    cleanup: Option<CleanupGuard>,
}

impl RelayStream {
    fn finish(&mut self) {
        if let Some(guard) = &self.cleanup {
            guard.finalize();
        }
    }
}

impl Stream for RelayStream {
    type Item = ChunkResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(route = this.route, error = %e, "Upstream stream failed mid-transfer");
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        metrics::record_bytes(self.route, self.bytes);
        tracing::debug!(route = self.route, bytes = self.bytes, "Relay finished");
        self.finish();
    }
}

/// Open a relay body for an upstream response.
///
/// Fails only if the upstream body errors before its first chunk.
pub async fn relay(
    response: reqwest::Response,
    route: &'static str,
    cleanup: Option<CleanupGuard>,
) -> Result<Body, reqwest::Error> {
    let mut upstream = response.bytes_stream().boxed();

    let first = match upstream.next().await {
        Some(Err(e)) => return Err(e),
        Some(Ok(chunk)) => Some(chunk),
        None => None,
    };

    let inner = stream::iter(first.map(Ok)).chain(upstream).boxed();
    let relay = RelayStream {
        inner,
        route,
        bytes: 0,
        cleanup,
    };
    Ok(Body::from_stream(relay))
}
