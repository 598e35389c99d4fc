//! Route table and dispatch.
//!
//! # Responsibilities
//! - Register routes per HTTP method, in order
//! - Freeze registrations into an immutable table
//! - Select the first matching route for a request
//! - Redirect non-canonical requests, execute canonical ones
//!
//! # Design Decisions
//! - Builder → immutable `RouteTable` (no registration once serving starts)
//! - O(n) ordered scan per method; registration order is the only priority
//! - Explicit NotFound rather than a silent default
//! - The dispatcher swaps whole tables atomically; a table is never mutated

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Bytes;
use axum::http::{Request, StatusCode};

use super::context::{Context, ResponseWriter};
use super::error::RouteError;
use super::route::{Matcher, Route};
use crate::observability::metrics;

/// HTTP methods a route can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Trace,
    Connect,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Options,
        Method::Trace,
        Method::Connect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
        }
    }

    /// Exact lookup of a request method. Request methods are case-sensitive.
    pub fn from_request(method: &str) -> Option<Self> {
        Method::ALL.into_iter().find(|m| m.as_str() == method)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for Method {
    type Err = RouteError;

    /// Parse a method name for registration (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RouteError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable registration phase of a route table.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: [Vec<Arc<Route>>; 8],
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `route` under every named method.
    ///
    /// Fails on the first unrecognized method name; methods before it have
    /// not been touched.
    pub fn add<S: AsRef<str>>(mut self, route: Route, methods: &[S]) -> Result<Self, RouteError> {
        let methods = methods
            .iter()
            .map(|m| m.as_ref().parse::<Method>())
            .collect::<Result<Vec<_>, _>>()?;
        self.register(Arc::new(route), &methods);
        Ok(self)
    }

    /// Register `route` under the given methods.
    pub fn route(mut self, route: Route, methods: &[Method]) -> Self {
        self.register(Arc::new(route), methods);
        self
    }

    fn register(&mut self, route: Arc<Route>, methods: &[Method]) {
        for method in methods {
            tracing::debug!(
                method = %method,
                kind = route.kind(),
                path = route.path(),
                priority = self.routes[method.index()].len(),
                "Route registered"
            );
            self.routes[method.index()].push(Arc::clone(&route));
        }
    }

    pub fn get(self, route: Route) -> Self {
        self.route(route, &[Method::Get])
    }

    pub fn head(self, route: Route) -> Self {
        self.route(route, &[Method::Head])
    }

    pub fn post(self, route: Route) -> Self {
        self.route(route, &[Method::Post])
    }

    pub fn put(self, route: Route) -> Self {
        self.route(route, &[Method::Put])
    }

    pub fn delete(self, route: Route) -> Self {
        self.route(route, &[Method::Delete])
    }

    pub fn options(self, route: Route) -> Self {
        self.route(route, &[Method::Options])
    }

    pub fn trace(self, route: Route) -> Self {
        self.route(route, &[Method::Trace])
    }

    pub fn connect(self, route: Route) -> Self {
        self.route(route, &[Method::Connect])
    }

    /// Freeze the registrations.
    pub fn build(self) -> RouteTable {
        let table = RouteTable { routes: self.routes };
        tracing::info!(routes = table.len(), "Route table built");
        table
    }
}

/// Immutable per-method route lists.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: [Vec<Arc<Route>>; 8],
}

/// Route chosen for a request, before anything has been executed.
#[derive(Debug)]
pub enum Selection<'a> {
    NotFound,
    /// Target location, query string included.
    Redirect(String),
    Execute(&'a Route),
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// Routes for `method`, in priority order.
    pub fn routes(&self, method: Method) -> &[Arc<Route>] {
        &self.routes[method.index()]
    }

    /// Number of registrations across all methods.
    pub fn len(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick the route for a request without running anything.
    pub fn select(&self, method: &str, path: &str, query: Option<&str>) -> Selection<'_> {
        let Some(method) = Method::from_request(method) else {
            return Selection::NotFound;
        };

        let Some(route) = self.routes(method).iter().find(|r| r.matches(path)) else {
            return Selection::NotFound;
        };

        match route.is_canonical(path) {
            (_, true) => Selection::Execute(route),
            (mut target, false) => {
                if let Some(query) = query.filter(|q| !q.is_empty()) {
                    target.push('?');
                    target.push_str(query);
                }
                Selection::Redirect(target)
            }
        }
    }
}

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NotFound,
    Redirect(String),
    Executed,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::NotFound => "not_found",
            Outcome::Redirect(_) => "redirect",
            Outcome::Executed => "executed",
        }
    }
}

/// Request entry point over the current route table.
pub struct Dispatcher {
    table: ArcSwap<RouteTable>,
}

impl Dispatcher {
    pub fn new(table: RouteTable) -> Self {
        metrics::record_table_size(table.len());
        Self {
            table: ArcSwap::from_pointee(table),
        }
    }

    /// Current route table.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Replace the route table. In-flight dispatches finish on the old one.
    pub fn replace(&self, table: RouteTable) {
        tracing::info!(routes = table.len(), "Route table replaced");
        metrics::record_table_size(table.len());
        self.table.store(Arc::new(table));
    }

    /// Route one request.
    ///
    /// NotFound sets `404`, Redirect sets `301` with `Location`, Executed
    /// leaves the response to the handler. Handler panics are not caught.
    pub fn dispatch(&self, ctx: &mut Context) -> Outcome {
        let start = Instant::now();
        let table = self.table.load_full();

        let outcome = match table.select(ctx.method().as_str(), ctx.path(), ctx.query()) {
            Selection::NotFound => {
                ctx.error(StatusCode::NOT_FOUND);
                Outcome::NotFound
            }
            Selection::Redirect(target) => {
                ctx.redirect_permanent(&target);
                Outcome::Redirect(target)
            }
            Selection::Execute(route) => {
                tracing::trace!(kind = route.kind(), pattern = route.path(), "Executing route");
                route.execute(ctx);
                Outcome::Executed
            }
        };

        tracing::debug!(
            method = %ctx.method(),
            path = %ctx.path(),
            outcome = outcome.label(),
            "Request dispatched"
        );
        metrics::record_dispatch(ctx.method().as_str(), &outcome, start);
        outcome
    }

    /// Build a context for `request`, dispatch it and return the response.
    pub fn handle(&self, request: Request<Bytes>) -> (Outcome, ResponseWriter) {
        let mut ctx = Context::new(request);
        let outcome = self.dispatch(&mut ctx);
        (outcome, ctx.into_response())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("routes", &self.table.load().len()).finish()
    }
}
