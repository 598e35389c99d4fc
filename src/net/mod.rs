//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (bind TCP, TLS or Unix socket, load certificates)
//!     → BoundListener handed to the HTTP server
//! ```
//!
//! # Design Decisions
//! - Binding happens before serving, so a bad address fails at startup
//! - Stale Unix socket files are replaced, other filesystem errors are fatal
//! - TLS is terminated by axum-server; the router never sees it

pub mod listener;

pub use listener::{BoundListener, ListenerError};
