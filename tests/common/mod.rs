//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::http::Request;
use tokio::sync::mpsc;

use canonical_router::config::ServerConfig;
use canonical_router::http::HttpServer;
use canonical_router::lifecycle::Shutdown;
use canonical_router::net::{listener, BoundListener};
use canonical_router::routing::RouteTable;

/// Build a bodiless request for in-process dispatch.
pub fn request(method: &str, uri: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
}

/// A server running on an ephemeral localhost port.
pub struct TestServer {
    pub url: String,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<RouteTable>,
}

impl TestServer {
    /// Absolute URL for `path_and_query`.
    pub fn at(&self, path_and_query: &str) -> String {
        format!("{}{}", self.url, path_and_query)
    }
}

/// Start an HTTP server serving `table` with an otherwise default config.
pub async fn start_server(table: RouteTable) -> TestServer {
    start_server_with(ServerConfig::default(), table).await
}

/// Start an HTTP server on 127.0.0.1 with an OS-assigned port.
pub async fn start_server_with(mut config: ServerConfig, table: RouteTable) -> TestServer {
    config.listener.ip = "127.0.0.1".to_string();
    config.listener.port = 0;

    let bound = listener::bind(&config.listener).await.unwrap();
    let url = match &bound {
        BoundListener::Tcp(l) => format!("http://{}", l.local_addr().unwrap()),
        _ => panic!("expected a TCP listener"),
    };

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let (updates, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        HttpServer::new(config, table).run(bound, rx, receiver).await.unwrap();
    });

    TestServer { url, shutdown, updates }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
