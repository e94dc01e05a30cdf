//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener, walking forward to the next port when busy
//!
//! # Design Decisions
//! - Only `AddrInUse` triggers a retry; any other bind error is fatal
//! - The number of fallback ports is bounded

use std::io::ErrorKind;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ports {first}..={last} are all in use")]
    PortsExhausted { first: u16, last: u16 },
}

/// Bind `host:port`, retrying on `port + 1`, `port + 2`, ... while the port
/// is in use, at most `retries` times.
pub async fn bind_with_retry(host: &str, port: u16, retries: u16) -> Result<TcpListener, StartupError> {
    let mut current = port;

    for attempt in 0..=retries {
        let addr = format!("{}:{}", host, current);
        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                if attempt > 0 {
                    tracing::info!(preferred = port, port = current, "Preferred port busy, using fallback port");
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse && attempt < retries => {
                let next = match current.checked_add(1) {
                    Some(next) => next,
                    None => break,
                };
                tracing::warn!(port = current, next, "Port is in use, retrying");
                current = next;
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => break,
            Err(source) => return Err(StartupError::Bind { addr, source }),
        }
    }

    Err(StartupError::PortsExhausted { first: port, last: current })
}

/// Bind the configured listener.
pub async fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    bind_with_retry(&config.host, config.port, config.port_retries).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_skips_busy_port() {
        let busy = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = busy.local_addr().unwrap().port();

        match bind_with_retry("127.0.0.1", port, 5).await {
            Ok(listener) => {
                let got = listener.local_addr().unwrap().port();
                assert_ne!(got, port);
                assert!(got > port && got <= port.saturating_add(5));
            }
            // the following ports may be taken by other processes
            Err(e) => assert!(matches!(e, StartupError::PortsExhausted { .. })),
        }
    }

    #[tokio::test]
    async fn test_no_retries_fails_fast() {
        let busy = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = busy.local_addr().unwrap().port();

        let err = bind_with_retry("127.0.0.1", port, 0).await.unwrap_err();
        assert!(matches!(err, StartupError::PortsExhausted { first, last } if first == port && last == port));
    }

    #[tokio::test]
    async fn test_invalid_host_is_fatal() {
        let err = bind_with_retry("definitely not a host", 3000, 5).await.unwrap_err();
        assert!(matches!(err, StartupError::Bind { .. }));
    }
}
