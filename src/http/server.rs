//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum service that feeds every request to the dispatcher
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve on TCP, TLS or Unix listeners with graceful shutdown
//! - Swap in reloaded route tables while serving
//! - Run handlers off the async workers, since they may block

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    map_response_body::MapResponseBodyLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::{request, response};
use crate::net::BoundListener;
use crate::routing::{Dispatcher, RouteTable};

/// How long in-flight TLS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for the serve loop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
}

/// HTTP server in front of the router.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a new HTTP server serving `table`.
    pub fn new(config: ServerConfig, table: RouteTable) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(table));
        let state = AppState {
            dispatcher: Arc::clone(&dispatcher),
            max_body_size: config.limits.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_timeout_secs)))
                    .layer(MapResponseBodyLayer::new(Body::new))
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_size)),
            )
    }

    /// Dispatcher shared with the request handler.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Route tables received on `route_updates` replace the current one.
    pub async fn run(
        self,
        listener: BoundListener,
        mut route_updates: mpsc::UnboundedReceiver<RouteTable>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        tracing::info!(listener = %listener, "HTTP server starting");

        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            while let Some(table) = route_updates.recv().await {
                dispatcher.replace(table);
            }
        });

        let signal = async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
        };

        let app = self.router.into_make_service();
        match listener {
            BoundListener::Tcp(listener) => {
                axum::serve(listener, app).with_graceful_shutdown(signal).await?;
            }
            BoundListener::Unix { listener, path } => {
                let served = axum::serve(listener, app).with_graceful_shutdown(signal).await;
                remove_socket(&path);
                served?;
            }
            BoundListener::Tls { listener, config } => {
                let handle = axum_server::Handle::new();
                let drain = handle.clone();
                tokio::spawn(async move {
                    signal.await;
                    drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
                });
                axum_server::from_tcp_rustls(listener, config)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Remove the socket file once the Unix listener stops, whatever the outcome.
fn remove_socket(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = ?path, error = %e, "Failed to remove socket file"),
    }
}

/// Buffer the request, dispatch it on the blocking pool and convert the result.
///
/// A panicking handler is reported as `500` here; the dispatcher itself never
/// catches handler failures.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let request = match request::buffer(request, state.max_body_size).await {
        Ok(request) => request,
        Err(status) => return status.into_response(),
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    match tokio::task::spawn_blocking(move || dispatcher.handle(request)).await {
        Ok((outcome, writer)) => {
            tracing::debug!(
                request_id = %request_id,
                outcome = outcome.label(),
                status = writer.status().as_u16(),
                "Request routed"
            );
            response::into_response(writer)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Handler failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.sock");
        std::fs::write(&path, b"").unwrap();

        remove_socket(&path);
        assert!(!path.exists());

        // Already gone: nothing to do.
        remove_socket(&path);
    }

    #[tokio::test]
    async fn test_socket_removed_when_serving_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.sock");
        let listener = crate::net::listener::unix(&path, 0o600).unwrap();
        assert!(path.exists());

        let server = HttpServer::new(ServerConfig::default(), RouteTable::default());
        let (_updates, rx) = mpsc::unbounded_channel();
        let (tx, shutdown) = broadcast::channel(1);
        let run = tokio::spawn(server.run(BoundListener::Unix { listener, path: path.clone() }, rx, shutdown));

        tx.send(()).unwrap();
        run.await.unwrap().unwrap();
        assert!(!path.exists());
    }
}
