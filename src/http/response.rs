//! Response conversion.
//!
//! # Responsibilities
//! - Turn the router's buffered `ResponseWriter` into an axum response
//! - Add `Content-Length` implicitly through the full body

use axum::body::Body;
use axum::response::Response;

use crate::routing::ResponseWriter;

/// Convert a finished `ResponseWriter` into an HTTP response.
pub fn into_response(writer: ResponseWriter) -> Response {
    let (status, headers, body) = writer.into_parts();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
