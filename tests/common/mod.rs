//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use media_proxy::config::ProxyConfig;
use media_proxy::extractor::{ExtractError, MediaExtractor};
use media_proxy::{HttpServer, Shutdown};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A request as seen by the mock upstream. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// What the mock upstream answers.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Advertised Content-Length; defaults to the body length.
    pub declared_length: Option<usize>,
    /// Write the body in 16 KiB chunks with this pause between them.
    pub pace: Option<Duration>,
    /// Keep the connection open after the body instead of closing it.
    pub stall: bool,
}

impl MockResponse {
    pub fn ok(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".into(), content_type.into())],
            body,
            declared_length: None,
            pace: None,
            stall: false,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            declared_length: None,
            pace: None,
            stall: false,
        }
    }

    pub fn redirect(location: &str) -> Self {
        let mut response = Self::status(302);
        response.headers.push(("Location".into(), location.into()));
        response
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Unknown",
    }
}

/// A running mock media origin.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a programmable mock origin on an ephemeral port.
pub async fn start_upstream<F>(f: F) -> MockUpstream
where
    F: Fn(&Recorded) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        log.lock().unwrap().push(request.clone());
                        let response = f(&request);

                        let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, reason(response.status));
                        for (name, value) in &response.headers {
                            head.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        let length = response.declared_length.unwrap_or(response.body.len());
                        head.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", length));

                        if socket.write_all(head.as_bytes()).await.is_err() {
                            return;
                        }
                        match response.pace {
                            Some(pause) => {
                                for chunk in response.body.chunks(16 * 1024) {
                                    if socket.write_all(chunk).await.is_err() {
                                        return;
                                    }
                                    tokio::time::sleep(pause).await;
                                }
                            }
                            None => {
                                let _ = socket.write_all(&response.body).await;
                            }
                        }
                        let _ = socket.flush().await;
                        if response.stall {
                            std::future::pending::<()>().await;
                        }
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream { addr, requests }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect();

    Some(Recorded { path, headers })
}

/// Start an origin that accepts requests and never answers them.
pub async fn start_hanging_upstream() -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let log = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = log.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    log.lock().unwrap().push(request);
                }
                std::future::pending::<()>().await;
                drop(socket);
            });
        }
    });

    MockUpstream { addr, requests }
}

/// Names of the entries directly inside `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Extractor returning a fixed result.
pub struct StaticExtractor(pub Result<Value, String>);

impl MediaExtractor for StaticExtractor {
    fn extract(&self, post_url: &str) -> BoxFuture<'_, Result<Value, ExtractError>> {
        let result = match &self.0 {
            Ok(value) => Ok(serde_json::json!({ "source": post_url, "media": value })),
            Err(message) => Err(ExtractError::Failed(message.clone())),
        };
        async move { result }.boxed()
    }
}

/// Test configuration with an isolated scratch directory.
pub fn test_config(scratch: &Path) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.upstream.use_system_proxy = false;
    config.downloads.dir = scratch.to_path_buf();
    config
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(
    config: ProxyConfig,
    extractor: Arc<dyn MediaExtractor>,
) -> (SocketAddr, Shutdown) {
    let server = HttpServer::with_extractor(config, extractor).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
