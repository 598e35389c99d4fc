//! Regular-expression routes.
//!
//! # Responsibilities
//! - Compile route patterns once, anchored to the whole path
//! - Named-capture routes exposing captures through `Context::params`
//! - Positional routes passing captures as handler arguments
//!
//! # Design Decisions
//! - Patterns are wrapped as `^(?:...)$` so a match always covers the whole
//!   path and extraction can never see a partial match
//! - A request whose canonical spelling matches is accepted too, so it is
//!   redirected instead of reported missing
//! - Captures are plain strings; no numeric coercion

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::canonical::canonicalize;
use super::context::{Context, Params};
use super::error::RouteError;
use super::positional::PositionalHandler;
use super::route::{Handler, Matcher};

type Invoke = Arc<dyn Fn(&mut Context, Vec<String>) + Send + Sync>;

/// Compile `pattern` so that it must match the entire path.
fn compile(pattern: &str) -> Result<Regex, RouteError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// True if `expr` accepts `path` or, for a non-canonical path, its canonical form.
fn accepts(expr: &Regex, path: &str) -> bool {
    if expr.is_match(path) {
        return true;
    }
    let (canonical, is_canonical) = canonicalize(path);
    !is_canonical && expr.is_match(&canonical)
}

/// Route matching a regular expression with named capture groups.
pub struct RegexRoute {
    source: String,
    expr: Regex,
    handler: Handler,
}

impl RegexRoute {
    /// Compile `pattern`. An invalid pattern is a configuration error.
    pub fn new(pattern: &str, handler: Handler) -> Result<Self, RouteError> {
        let expr = compile(pattern)?;
        tracing::trace!(pattern = %pattern, groups = expr.captures_len() - 1, "Compiled regex route");
        Ok(Self {
            source: pattern.to_string(),
            expr,
            handler,
        })
    }
}

impl fmt::Debug for RegexRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexRoute").field("pattern", &self.source).finish_non_exhaustive()
    }
}

impl Matcher for RegexRoute {
    fn path(&self) -> &str {
        &self.source
    }

    fn is_canonical(&self, path: &str) -> (String, bool) {
        canonicalize(path)
    }

    fn matches(&self, path: &str) -> bool {
        accepts(&self.expr, path)
    }

    fn execute(&self, ctx: &mut Context) {
        let params = Params::Deferred {
            expr: self.expr.clone(),
            path: ctx.path().to_string(),
        };
        ctx.set_params(params);
        (self.handler)(ctx);
    }
}

/// Route matching a regular expression and binding captures to arguments.
pub struct PositionalRoute {
    source: String,
    expr: Regex,
    arity: usize,
    invoke: Invoke,
}

impl PositionalRoute {
    /// Compile `pattern` and check that `handler` takes one `String` per group.
    pub fn new<H, Args>(pattern: &str, handler: H) -> Result<Self, RouteError>
    where
        H: PositionalHandler<Args>,
        Args: 'static,
    {
        let expr = compile(pattern)?;
        let groups = expr.captures_len() - 1;
        if groups != H::ARITY {
            return Err(RouteError::ArityMismatch {
                pattern: pattern.to_string(),
                groups,
                params: H::ARITY,
            });
        }

        let invoke: Invoke = Arc::new(move |ctx: &mut Context, captures: Vec<String>| {
            PositionalHandler::<Args>::invoke(&handler, ctx, captures)
        });

        Ok(Self {
            source: pattern.to_string(),
            expr,
            arity: groups,
            invoke,
        })
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for PositionalRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionalRoute")
            .field("pattern", &self.source)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl Matcher for PositionalRoute {
    fn path(&self) -> &str {
        &self.source
    }

    fn is_canonical(&self, path: &str) -> (String, bool) {
        canonicalize(path)
    }

    fn matches(&self, path: &str) -> bool {
        accepts(&self.expr, path)
    }

    fn execute(&self, ctx: &mut Context) {
        let Some(captures) = self.expr.captures(ctx.path()) else {
            panic!("route pattern {} accepted {:?} but cannot decompose it", self.source, ctx.path());
        };

        let mut args = Vec::with_capacity(self.arity);
        let mut params = HashMap::new();
        for (index, name) in self.expr.capture_names().enumerate().skip(1) {
            let value = captures.get(index).map_or("", |m| m.as_str()).to_string();
            if let Some(name) = name {
                params.insert(name.to_string(), value.clone());
            }
            args.push(value);
        }

        ctx.set_params(Params::Resolved(Arc::new(params)));
        (self.invoke)(ctx, args);
    }
}
