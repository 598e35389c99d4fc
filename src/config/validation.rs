//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Build every configured route once so bad methods and patterns surface here
//! - Validate listener settings for the selected transport
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use thiserror::Error;

use crate::config::catalog::build_route;
use crate::config::schema::{ListenerKind, ServerConfig};
use crate::routing::RouteError;

/// A single semantic problem in a configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("route {name:?}: {source}")]
    Route {
        name: String,
        #[source]
        source: RouteError,
    },

    #[error("route {name:?}: a {kind} route needs a path")]
    MissingPath { name: String, kind: &'static str },

    #[error("route {name:?}: invalid status code {status}")]
    InvalidStatus { name: String, status: u16 },

    #[error("route {name:?}: invalid content type {content_type:?}")]
    InvalidContentType { name: String, content_type: String },

    #[error("listener: invalid IP address {0:?}")]
    InvalidAddress(String),

    #[error("listener: tls listener requires a [listener.tls] section")]
    MissingTls,

    #[error("listener: invalid socket mode {0:?} (expected octal, e.g. \"0660\")")]
    InvalidSocketMode(String),

    #[error("listener: socket_path must not be empty")]
    MissingSocketPath,

    #[error("limits: request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    match listener.kind {
        ListenerKind::Tcp | ListenerKind::Tls => {
            if listener.ip.parse::<IpAddr>().is_err() {
                errors.push(ValidationError::InvalidAddress(listener.ip.clone()));
            }
            if listener.kind == ListenerKind::Tls && listener.tls.is_none() {
                errors.push(ValidationError::MissingTls);
            }
        }
        ListenerKind::Unix => {
            if listener.socket_path.is_empty() {
                errors.push(ValidationError::MissingSocketPath);
            }
            if parse_mode(&listener.socket_mode).is_none() {
                errors.push(ValidationError::InvalidSocketMode(listener.socket_mode.clone()));
            }
        }
    }

    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for route in &config.routes {
        if let Err(e) = build_route(route) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse an octal file mode such as `"0660"`.
pub fn parse_mode(mode: &str) -> Option<u32> {
    u32::from_str_radix(mode, 8).ok().filter(|m| *m <= 0o7777)
}
