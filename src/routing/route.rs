//! Route variants and the matching contract they share.
//!
//! # Responsibilities
//! - Define the `Matcher` contract (path, canonical check, match, execute)
//! - Exact static routes and the catch-all wildcard
//! - Close the set of variants in the `Route` enum
//!
//! # Design Decisions
//! - Closed set of variants, dispatched through an enum rather than trait objects
//! - Routes are immutable once constructed and shared via `Arc`
//! - Static and wildcard routes never allocate a parameter map

use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Request;

use super::canonical::canonicalize;
use super::context::{Context, Params, ResponseWriter};
use super::error::RouteError;
use super::pattern::{PositionalRoute, RegexRoute};
use super::positional::PositionalHandler;

/// A route handler. Handlers report failures through the response they write.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Adapt a plain request/response function into a route [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Request<Bytes>, &mut ResponseWriter) + Send + Sync + 'static,
{
    Arc::new(move |ctx: &mut Context| {
        let mut response = std::mem::take(ctx.response_mut());
        f(ctx.request(), &mut response);
        *ctx.response_mut() = response;
    })
}

/// Capability shared by every route variant.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Registered literal or pattern source. Empty for the wildcard.
    fn path(&self) -> &str;

    /// Canonical form of `path` and whether `path` already is canonical.
    fn is_canonical(&self, path: &str) -> (String, bool);

    /// Returns true if the route accepts `path`.
    ///
    /// Regex routes also accept a non-canonical path whose canonical form
    /// matches, so the request is redirected rather than passed on. Such a
    /// path is therefore claimed by the regex route even when a later
    /// wildcard would otherwise catch it.
    fn matches(&self, path: &str) -> bool;

    /// Run the bound handler. Only called for paths accepted by `matches`.
    fn execute(&self, ctx: &mut Context);
}

/// Matches one literal path, byte for byte.
///
/// The literal is expected to be canonical. A non-canonical literal matches
/// its request, gets redirected to the canonical spelling, and that spelling
/// no longer matches this route.
pub struct StaticRoute {
    path: String,
    handler: Handler,
}

impl StaticRoute {
    pub fn new(path: impl Into<String>, handler: Handler) -> Self {
        let path = path.into();
        let (canonical, is_canonical) = canonicalize(&path);
        if !is_canonical {
            tracing::warn!(
                path = %path,
                canonical = %canonical,
                "Static route registered with a non-canonical path; requests for it will redirect away"
            );
        }
        Self { path, handler }
    }
}

impl fmt::Debug for StaticRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticRoute").field("path", &self.path).finish_non_exhaustive()
    }
}

impl Matcher for StaticRoute {
    fn path(&self) -> &str {
        &self.path
    }

    fn is_canonical(&self, path: &str) -> (String, bool) {
        canonicalize(path)
    }

    fn matches(&self, path: &str) -> bool {
        self.path == path
    }

    fn execute(&self, ctx: &mut Context) {
        ctx.set_params(Params::Empty);
        (self.handler)(ctx);
    }
}

/// Matches everything and never redirects.
///
/// Register it last for a method: nothing after it is ever reached.
pub struct WildcardRoute {
    handler: Handler,
}

impl WildcardRoute {
    pub fn new(handler: Handler) -> Self {
        Self { handler }
    }
}

impl fmt::Debug for WildcardRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WildcardRoute").finish_non_exhaustive()
    }
}

impl Matcher for WildcardRoute {
    fn path(&self) -> &str {
        ""
    }

    fn is_canonical(&self, path: &str) -> (String, bool) {
        (path.to_string(), true)
    }

    fn matches(&self, _path: &str) -> bool {
        true
    }

    fn execute(&self, ctx: &mut Context) {
        ctx.set_params(Params::Empty);
        (self.handler)(ctx);
    }
}

/// A registered route.
#[derive(Debug)]
pub enum Route {
    Static(StaticRoute),
    Wildcard(WildcardRoute),
    Regex(RegexRoute),
    RegexPositional(PositionalRoute),
}

impl Route {
    /// Exact-path route.
    pub fn exact<F>(path: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        Route::Static(StaticRoute::new(path, Arc::new(f)))
    }

    /// Catch-all route.
    pub fn wildcard<F>(f: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        Route::Wildcard(WildcardRoute::new(Arc::new(f)))
    }

    /// Regex route exposing named captures through [`Context::params`].
    pub fn regex<F>(pattern: &str, f: F) -> Result<Self, RouteError>
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        Ok(Route::Regex(RegexRoute::new(pattern, Arc::new(f))?))
    }

    /// Regex route passing each capture to the handler as a `String` argument.
    pub fn positional<H, Args>(pattern: &str, h: H) -> Result<Self, RouteError>
    where
        H: PositionalHandler<Args>,
        Args: 'static,
    {
        Ok(Route::RegexPositional(PositionalRoute::new(pattern, h)?))
    }

    fn matcher(&self) -> &dyn Matcher {
        match self {
            Route::Static(route) => route,
            Route::Wildcard(route) => route,
            Route::Regex(route) => route,
            Route::RegexPositional(route) => route,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Route::Static(_) => "static",
            Route::Wildcard(_) => "wildcard",
            Route::Regex(_) => "regex",
            Route::RegexPositional(_) => "regex_positional",
        }
    }
}

impl Matcher for Route {
    fn path(&self) -> &str {
        self.matcher().path()
    }

    fn is_canonical(&self, path: &str) -> (String, bool) {
        self.matcher().is_canonical(path)
    }

    fn matches(&self, path: &str) -> bool {
        self.matcher().matches(path)
    }

    fn execute(&self, ctx: &mut Context) {
        self.matcher().execute(ctx)
    }
}
