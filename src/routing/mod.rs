//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query)
//!     → router.rs (per-method route lookup)
//!     → route.rs / pattern.rs (evaluate match predicate, first match wins)
//!     → canonical.rs (redirect to the canonical path, or execute)
//!     → Return: Executed, Redirect(target) or NotFound
//!
//! Route Compilation (at startup):
//!     Route registrations
//!     → RouteTableBuilder (per-method, insertion ordered)
//!     → Compile regex patterns once
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Registration order is the only tie-break: first match wins
//! - Configuration mistakes (bad method, bad regex, handler arity) fail at
//!   build time, never per request
//! - NotFound and Redirect are outcomes, not errors

pub mod canonical;
pub mod context;
pub mod error;
pub mod pattern;
pub mod positional;
pub mod route;
pub mod router;

pub use canonical::canonicalize;
pub use context::{Context, Params, ResponseWriter};
pub use error::RouteError;
pub use pattern::{PositionalRoute, RegexRoute};
pub use positional::PositionalHandler;
pub use route::{handler, Handler, Matcher, Route, StaticRoute, WildcardRoute};
pub use router::{Dispatcher, Method, Outcome, RouteTable, RouteTableBuilder, Selection};
