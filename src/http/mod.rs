//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS/Unix connection
//!     → server.rs (Axum setup, middleware, listener-specific serve loop)
//!     → request.rs (buffer the body, build the router's request)
//!     → routing::Dispatcher (NotFound / Redirect / Executed)
//!     → response.rs (ResponseWriter → HTTP response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::{HttpServer, ServerError};
