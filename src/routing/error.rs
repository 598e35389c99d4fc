//! Route configuration errors.
//!
//! Every variant is raised while the route table is being built. Nothing in
//! here is ever produced while a request is being dispatched.

use thiserror::Error;

/// Error raised while registering or constructing a route.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Method name outside GET, HEAD, POST, PUT, DELETE, OPTIONS, TRACE, CONNECT.
    #[error("Invalid HTTP method: {0}")]
    UnknownMethod(String),

    /// Pattern failed to compile.
    #[error("Invalid route pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Positional handler does not take one argument per capture group.
    #[error("Route pattern {pattern:?} has {groups} capture group(s) but the handler takes {params}")]
    ArityMismatch {
        pattern: String,
        groups: usize,
        params: usize,
    },
}
