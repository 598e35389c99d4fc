//! Per-request execution context.
//!
//! # Responsibilities
//! - Carry the inbound request to the handler
//! - Collect the outbound response (status, headers, body)
//! - Expose path parameters without computing them up front
//!
//! # Design Decisions
//! - A fresh `Context` per request; never shared between requests
//! - Parameters are an explicit `Params` value: empty, deferred or resolved
//! - The response is buffered; the server turns it into an HTTP response

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use regex::Regex;

/// Path parameters attached to a [`Context`].
///
/// Reading is idempotent: every call to [`Params::get`] yields the same map.
#[derive(Debug, Clone, Default)]
pub enum Params {
    /// The route has no captures.
    #[default]
    Empty,
    /// Named captures, extracted from `path` on first read.
    Deferred { expr: Regex, path: String },
    /// Captures already extracted while executing the route.
    Resolved(Arc<HashMap<String, String>>),
}

impl Params {
    /// Build the parameter map.
    ///
    /// # Panics
    ///
    /// A deferred extraction whose expression no longer matches its path is a
    /// broken route invariant (the route only executes matching paths) and
    /// panics rather than returning a partial map.
    pub fn get(&self) -> HashMap<String, String> {
        match self {
            Params::Empty => HashMap::new(),
            Params::Resolved(map) => map.as_ref().clone(),
            Params::Deferred { expr, path } => match named_captures(expr, path) {
                Some(map) => map,
                None => panic!("route pattern {} accepted {path:?} but cannot decompose it", expr.as_str()),
            },
        }
    }

    /// Look up a single parameter.
    pub fn value(&self, name: &str) -> Option<String> {
        match self {
            Params::Empty => None,
            Params::Resolved(map) => map.get(name).cloned(),
            Params::Deferred { .. } => self.get().remove(name),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::Empty => true,
            Params::Resolved(map) => map.is_empty(),
            Params::Deferred { expr, .. } => expr.capture_names().flatten().next().is_none(),
        }
    }
}

/// Map each named group of `expr` to its capture in `path`.
///
/// Index 0 (the whole match) and unnamed groups are skipped. A group that did
/// not take part in the match maps to an empty string.
pub(crate) fn named_captures(expr: &Regex, path: &str) -> Option<HashMap<String, String>> {
    let captures = expr.captures(path)?;
    let map = expr
        .capture_names()
        .enumerate()
        .skip(1)
        .filter_map(|(index, name)| {
            let value = captures.get(index).map_or("", |m| m.as_str());
            name.map(|name| (name.to_string(), value.to_string()))
        })
        .collect();
    Some(map)
}

/// Buffered response sink handed to handlers.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Append bytes to the body.
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.body.extend_from_slice(data.as_ref());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

/// The request, the response sink and the path parameters of one dispatch.
#[derive(Debug)]
pub struct Context {
    request: Request<Bytes>,
    response: ResponseWriter,
    params: Params,
}

impl Context {
    /// Create a context with no parameters and an empty `200 OK` response.
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            response: ResponseWriter::new(),
            params: Params::Empty,
        }
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Raw query string, if the request had one.
    pub fn query(&self) -> Option<&str> {
        self.request.uri().query()
    }

    /// First value of a decoded query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// Path parameters of the matched route.
    pub fn params(&self) -> HashMap<String, String> {
        self.params.get()
    }

    /// A single path parameter of the matched route.
    pub fn param(&self, name: &str) -> Option<String> {
        self.params.value(name)
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// Append bytes to the response body.
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.response.write(data);
    }

    /// Temporary redirect (`302 Found`).
    pub fn redirect(&mut self, location: &str) {
        self.redirect_with(location, StatusCode::FOUND);
    }

    /// Permanent redirect (`301 Moved Permanently`).
    pub fn redirect_permanent(&mut self, location: &str) {
        self.redirect_with(location, StatusCode::MOVED_PERMANENTLY);
    }

    fn redirect_with(&mut self, location: &str, status: StatusCode) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.response.set_header(header::LOCATION, value);
                self.response.set_status(status);
            }
            Err(_) => {
                tracing::warn!(location = %location, "Redirect target is not a valid header value");
                self.response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    /// Set an error status; the body is left to the caller.
    pub fn error(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    pub fn into_response(self) -> ResponseWriter {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(uri: &str) -> Context {
        let request = Request::builder().uri(uri).body(Bytes::new()).unwrap();
        Context::new(request)
    }

    #[test]
    fn test_new_context_has_no_params() {
        let ctx = context("/about/");
        assert!(ctx.params().is_empty());
        assert_eq!(ctx.param("id"), None);
        assert_eq!(ctx.response().status(), StatusCode::OK);
    }

    #[test]
    fn test_deferred_params_are_idempotent() {
        let expr = Regex::new(r"^(?:/users/(?P<id>[0-9]+)/)$").unwrap();
        let params = Params::Deferred { expr, path: "/users/42/".to_string() };

        let first = params.get();
        let second = params.get();
        assert_eq!(first, second);
        assert_eq!(first.get("id").map(String::as_str), Some("42"));
        assert_eq!(params.value("id").as_deref(), Some("42"));
    }

    #[test]
    fn test_unnamed_and_missing_groups() {
        let expr = Regex::new(r"^(?:/a/([a-z]+)/(?P<opt>[0-9]+)?/?)$").unwrap();
        let map = named_captures(&expr, "/a/foo/").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("opt").map(String::as_str), Some(""));
    }

    #[test]
    fn test_query_param_decoding() {
        let ctx = context("/search/?q=hello%20world&callback=cb");
        assert_eq!(ctx.query_param("q").as_deref(), Some("hello world"));
        assert_eq!(ctx.query_param("callback").as_deref(), Some("cb"));
        assert_eq!(ctx.query_param("missing"), None);
    }

    #[test]
    fn test_redirects_set_location() {
        let mut ctx = context("/old");
        ctx.redirect_permanent("/new/");
        assert_eq!(ctx.response().status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(ctx.response().headers()[header::LOCATION], "/new/");

        let mut ctx = context("/old");
        ctx.redirect("/temp/");
        assert_eq!(ctx.response().status(), StatusCode::FOUND);
    }

    #[test]
    fn test_write_appends_body() {
        let mut ctx = context("/");
        ctx.write("hello ");
        ctx.write(b"world");
        ctx.error(StatusCode::IM_A_TEAPOT);
        let (status, _, body) = ctx.into_response().into_parts();
        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(body, b"hello world");
    }
}
