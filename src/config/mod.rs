//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, every route built once)
//!     → ServerConfig (validated, immutable)
//!     → catalog.rs (configured routes → frozen RouteTable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → catalog.rs builds a new RouteTable
//!     → dispatcher swaps tables atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod catalog;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::ListenerConfig;
pub use schema::RouteConfig;
pub use schema::ServerConfig;
