//! Method-dispatched HTTP router with canonical-path redirects.
//!
//! Routes match a request path by exact string, by regular expression, or
//! unconditionally. A matching route whose path is not canonical answers with
//! a permanent redirect to the cleaned path instead of running its handler.

pub mod config;
pub mod encoding;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Context, Dispatcher, Method, Outcome, Route, RouteError, RouteTable};
