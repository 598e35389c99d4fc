//! Response encoding for handlers.
//!
//! # Responsibilities
//! - Pick JSON, JSONP or XML from the request's `Accept` header and `callback` query
//! - Serialize a value into the context's response with a status code
//! - Decode JSON or XML request bodies for POST and PUT
//!
//! # Design Decisions
//! - Only the media type of `Accept` is considered; parameters are ignored
//! - An explicit `application/json` never produces JSONP
//! - Bodies are decoded as XML only when `Accept` is `application/xml`
//! - A serialization failure still sets the status (500) before returning

use axum::http::{header, HeaderValue, Method, StatusCode};
use quick_xml::errors::serialize::{DeError, SeError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::routing::Context;

const JSON: &str = "application/json";
const JAVASCRIPT: &str = "application/javascript";
const XML: &str = "application/xml";

/// Error type for encoding and decoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to serialize response: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to decode request body: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("Failed to serialize response as XML: {0}")]
    SerializeXml(#[source] SeError),

    #[error("Failed to decode XML request body: {0}")]
    DeserializeXml(#[source] DeError),

    #[error("Request body of {actual} bytes exceeds limit of {limit}")]
    TooLarge { limit: usize, actual: usize },
}

#[derive(Debug, PartialEq, Eq)]
enum Encoding {
    Json,
    Jsonp(String),
    Xml,
}

/// Media type of the `Accept` header, parameters stripped.
fn accepted(ctx: &Context) -> String {
    ctx.headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn negotiate(ctx: &Context) -> Encoding {
    match accepted(ctx).as_str() {
        JSON => Encoding::Json,
        XML => Encoding::Xml,
        _ => match ctx.query_param("callback") {
            Some(callback) if !callback.is_empty() => Encoding::Jsonp(callback),
            _ => Encoding::Json,
        },
    }
}

/// Wrap JSON in a JSONP callback invocation.
fn pad(json: &[u8], callback: &str) -> Vec<u8> {
    let mut padded = Vec::with_capacity(json.len() + callback.len() + 2);
    padded.extend_from_slice(callback.as_bytes());
    padded.push(b'(');
    padded.extend_from_slice(json);
    padded.push(b')');
    padded
}

/// Encode `data` into the response with `200 OK`.
pub fn write<T: Serialize>(ctx: &mut Context, data: &T) -> Result<(), EncodeError> {
    write_status(ctx, data, StatusCode::OK)
}

/// Encode `data` into the response with `status`.
pub fn write_status<T: Serialize>(ctx: &mut Context, data: &T, status: StatusCode) -> Result<(), EncodeError> {
    let encoding = negotiate(ctx);
    let (content_type, encoded) = match &encoding {
        Encoding::Json => (JSON, serde_json::to_vec(data).map_err(EncodeError::Serialize)),
        Encoding::Jsonp(callback) => (
            JAVASCRIPT,
            serde_json::to_vec(data)
                .map(|json| pad(&json, callback))
                .map_err(EncodeError::Serialize),
        ),
        Encoding::Xml => (
            XML,
            quick_xml::se::to_string(data)
                .map(String::into_bytes)
                .map_err(EncodeError::SerializeXml),
        ),
    };

    let response = ctx.response_mut();
    response.set_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

    match encoded {
        Ok(body) => {
            response.set_status(status);
            response.write(body);
            Ok(())
        }
        Err(e) => {
            response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            Err(e)
        }
    }
}

fn has_body(ctx: &Context) -> bool {
    ctx.method() == Method::POST || ctx.method() == Method::PUT
}

fn decode<T: DeserializeOwned>(ctx: &Context) -> Result<Option<T>, EncodeError> {
    let body = ctx.body().as_ref();
    if accepted(ctx) == XML {
        quick_xml::de::from_reader(body)
            .map(Some)
            .map_err(EncodeError::DeserializeXml)
    } else {
        serde_json::from_slice(body)
            .map(Some)
            .map_err(EncodeError::Deserialize)
    }
}

/// Decode a JSON or XML body. Requests other than POST and PUT yield `None`.
pub fn read<T: DeserializeOwned>(ctx: &Context) -> Result<Option<T>, EncodeError> {
    if !has_body(ctx) {
        return Ok(None);
    }
    decode(ctx)
}

/// Like [`read`], refusing bodies larger than `limit` bytes.
pub fn read_max<T: DeserializeOwned>(ctx: &Context, limit: usize) -> Result<Option<T>, EncodeError> {
    if !has_body(ctx) {
        return Ok(None);
    }
    let actual = ctx.body().len();
    if actual > limit {
        return Err(EncodeError::TooLarge { limit, actual });
    }
    decode(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct User {
        id: u32,
        name: String,
    }

    fn context(method: &str, uri: &str, accept: Option<&str>, body: &str) -> Context {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        Context::new(builder.body(Bytes::from(body.to_string())).unwrap())
    }

    fn user() -> User {
        User {
            id: 7,
            name: "ada".to_string(),
        }
    }

    #[test]
    fn test_default_is_json() {
        let mut ctx = context("GET", "/users/7/", None, "");
        write(&mut ctx, &user()).unwrap();
        let response = ctx.response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON);
        assert_eq!(response.body(), br#"{"id":7,"name":"ada"}"#);
    }

    #[test]
    fn test_callback_produces_jsonp() {
        let mut ctx = context("GET", "/users/7/?callback=handle", Some("*/*"), "");
        write_status(&mut ctx, &user(), StatusCode::CREATED).unwrap();
        let response = ctx.response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JAVASCRIPT);
        assert_eq!(response.body(), br#"handle({"id":7,"name":"ada"})"#);
    }

    #[test]
    fn test_explicit_json_ignores_callback() {
        let ctx = context("GET", "/?callback=handle", Some("application/json; charset=utf-8"), "");
        assert_eq!(negotiate(&ctx), Encoding::Json);

        let ctx = context("GET", "/?callback=", None, "");
        assert_eq!(negotiate(&ctx), Encoding::Json);
    }

    #[test]
    fn test_serialize_failure_sets_500() {
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1);
        let mut ctx = context("GET", "/", None, "");
        let err = write(&mut ctx, &bad).unwrap_err();
        assert!(matches!(err, EncodeError::Serialize(_)));
        assert_eq!(ctx.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(ctx.response().body().is_empty());
    }

    #[test]
    fn test_read_only_for_post_and_put() {
        let body = r#"{"id":7,"name":"ada"}"#;
        let ctx = context("POST", "/users/", None, body);
        assert_eq!(read::<User>(&ctx).unwrap(), Some(user()));

        let ctx = context("PUT", "/users/7/", None, body);
        assert_eq!(read::<User>(&ctx).unwrap(), Some(user()));

        let ctx = context("GET", "/users/7/", None, body);
        assert_eq!(read::<User>(&ctx).unwrap(), None);

        let ctx = context("POST", "/users/", None, "{not json");
        assert!(matches!(read::<User>(&ctx), Err(EncodeError::Deserialize(_))));
    }

    #[test]
    fn test_read_max_limit() {
        let ctx = context("POST", "/users/", None, r#"{"id":7,"name":"ada"}"#);
        assert!(matches!(read_max::<User>(&ctx, 4), Err(EncodeError::TooLarge { limit: 4, .. })));
        assert!(read_max::<User>(&ctx, 1024).unwrap().is_some());
    }

    #[test]
    fn test_read_max_ignores_get_body() {
        let ctx = context("GET", "/users/7/", None, r#"{"id":7,"name":"ada"}"#);
        assert_eq!(read_max::<User>(&ctx, 4).unwrap(), None);
    }

    #[test]
    fn test_xml_accept_produces_xml() {
        let mut ctx = context("GET", "/users/7/?callback=handle", Some("application/xml"), "");
        write(&mut ctx, &user()).unwrap();
        let response = ctx.response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XML);
        assert_eq!(response.body(), b"<User><id>7</id><name>ada</name></User>");
    }

    #[test]
    fn test_xml_serialize_failure_sets_500() {
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], 1);
        let mut ctx = context("GET", "/", Some("application/xml"), "");
        let err = write(&mut ctx, &bad).unwrap_err();
        assert!(matches!(err, EncodeError::SerializeXml(_)));
        assert_eq!(ctx.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_read_xml_body() {
        let body = "<User><id>7</id><name>ada</name></User>";
        let ctx = context("POST", "/users/", Some("application/xml"), body);
        assert_eq!(read::<User>(&ctx).unwrap(), Some(user()));
        assert_eq!(read_max::<User>(&ctx, 1024).unwrap(), Some(user()));

        let ctx = context("PUT", "/users/7/", Some("application/xml"), "<User><id>x</id></User>");
        assert!(matches!(read::<User>(&ctx), Err(EncodeError::DeserializeXml(_))));

        // Without the XML Accept type, the body is read as JSON.
        let ctx = context("POST", "/users/", None, body);
        assert!(matches!(read::<User>(&ctx), Err(EncodeError::Deserialize(_))));
    }
}
