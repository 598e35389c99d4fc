//! Routes declared in configuration.
//!
//! Each configured route answers with a fixed status, content type and body.
//! Regex routes may interpolate named captures into the body with `{name}`.

use std::collections::HashMap;

use axum::http::{header, HeaderValue, StatusCode};

use crate::config::schema::{RouteConfig, RouteKind};
use crate::config::validation::ValidationError;
use crate::routing::{Context, Method, Route, RouteError, RouteTable};

/// Fixed response produced by a configured route.
#[derive(Debug, Clone)]
struct Responder {
    status: StatusCode,
    content_type: HeaderValue,
    body: String,
}

impl Responder {
    fn respond(&self, ctx: &mut Context) {
        let body = render(&self.body, &ctx.params());
        let response = ctx.response_mut();
        response.set_status(self.status);
        response.set_header(header::CONTENT_TYPE, self.content_type.clone());
        response.write(body);
    }
}

/// Replace every `{name}` in `template` with the matching parameter.
fn render(template: &str, params: &HashMap<String, String>) -> String {
    params.iter().fold(template.to_string(), |body, (name, value)| {
        body.replace(&format!("{{{name}}}"), value)
    })
}

/// Build the route described by `config`, with the methods it registers under.
pub fn build_route(config: &RouteConfig) -> Result<(Route, Vec<Method>), ValidationError> {
    let route_error = |source: RouteError| ValidationError::Route {
        name: config.name.clone(),
        source,
    };

    let methods = config
        .methods
        .iter()
        .map(|m| m.parse::<Method>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(route_error)?;

    let status = StatusCode::from_u16(config.status).map_err(|_| ValidationError::InvalidStatus {
        name: config.name.clone(),
        status: config.status,
    })?;

    let content_type =
        HeaderValue::from_str(&config.content_type).map_err(|_| ValidationError::InvalidContentType {
            name: config.name.clone(),
            content_type: config.content_type.clone(),
        })?;

    let responder = Responder {
        status,
        content_type,
        body: config.body.clone(),
    };
    let handler = move |ctx: &mut Context| responder.respond(ctx);

    let route = match config.kind {
        RouteKind::Wildcard => Route::wildcard(handler),
        RouteKind::Static | RouteKind::Regex if config.path.is_empty() => {
            return Err(ValidationError::MissingPath {
                name: config.name.clone(),
                kind: if config.kind == RouteKind::Static { "static" } else { "regex" },
            });
        }
        RouteKind::Static => Route::exact(config.path.clone(), handler),
        RouteKind::Regex => Route::regex(&config.path, handler).map_err(route_error)?,
    };

    Ok((route, methods))
}

/// Build a frozen route table from configured routes, in order.
pub fn build_table(routes: &[RouteConfig]) -> Result<RouteTable, Vec<ValidationError>> {
    let mut builder = RouteTable::builder();
    let mut errors = Vec::new();

    for config in routes {
        match build_route(config) {
            Ok((route, methods)) => {
                tracing::debug!(name = %config.name, kind = route.kind(), "Configured route");
                builder = builder.route(route, &methods);
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(builder.build())
    } else {
        Err(errors)
    }
}
