//! Request preparation.
//!
//! # Responsibilities
//! - Buffer the request body up to the configured limit
//! - Hand the router a `Request<Bytes>` with method, URI and headers intact
//!
//! # Design Decisions
//! - Bodies are buffered before dispatch; handlers run synchronously and never
//!   touch the connection
//! - Oversize bodies are rejected before any route is selected

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};

/// Buffer `request` into the form the router works on.
///
/// Returns `413 Payload Too Large` when the body exceeds `limit`.
pub async fn buffer(request: Request<Body>, limit: usize) -> Result<Request<Bytes>, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::warn!(error = %e, limit, "Request body rejected");
        StatusCode::PAYLOAD_TOO_LARGE
    })?;
    Ok(Request::from_parts(parts, bytes))
}
