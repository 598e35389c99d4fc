//! Routing behaviour through the public dispatcher API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::{header, StatusCode};

use canonical_router::routing::{Context, Dispatcher, Matcher, Method, Outcome, Route, RouteError, RouteTable, Selection};

mod common;
use common::request;

#[test]
fn test_named_captures_reach_the_handler() {
    let seen = Arc::new(Mutex::new(HashMap::new()));
    let sink = Arc::clone(&seen);
    let table = RouteTable::builder()
        .get(
            Route::regex(r"^/users/(?P<id>[0-9]+)/$", move |ctx: &mut Context| {
                *sink.lock().unwrap() = ctx.params();
            })
            .unwrap(),
        )
        .build();
    let dispatcher = Dispatcher::new(table);

    let (outcome, _) = dispatcher.handle(request("GET", "/users/42/"));
    assert_eq!(outcome, Outcome::Executed);
    assert_eq!(
        *seen.lock().unwrap(),
        HashMap::from([("id".to_string(), "42".to_string())])
    );
}

#[test]
fn test_missing_trailing_slash_redirects() {
    let table = RouteTable::builder()
        .get(Route::regex(r"^/users/(?P<id>[0-9]+)/$", |_ctx: &mut Context| panic!("must not run")).unwrap())
        .build();
    let dispatcher = Dispatcher::new(table);

    let (outcome, response) = dispatcher.handle(request("GET", "/users/42"));
    assert_eq!(outcome, Outcome::Redirect("/users/42/".to_string()));
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()[header::LOCATION], "/users/42/");

    let (outcome, response) = dispatcher.handle(request("GET", "/users//42?tab=posts"));
    assert_eq!(outcome, Outcome::Redirect("/users/42/?tab=posts".to_string()));
    assert_eq!(response.headers()[header::LOCATION], "/users/42/?tab=posts");
}

#[test]
fn test_positional_handler_receives_captures_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let table = RouteTable::builder()
        .get(
            Route::positional(r"^/a/([a-z]+)/([a-z]+)/$", move |ctx: &mut Context, first: String, second: String| {
                ctx.write(format!("{first}-{second}"));
                sink.lock().unwrap().extend([first, second]);
            })
            .unwrap(),
        )
        .build();
    let dispatcher = Dispatcher::new(table);

    let (outcome, response) = dispatcher.handle(request("GET", "/a/foo/bar/"));
    assert_eq!(outcome, Outcome::Executed);
    assert_eq!(response.body(), b"foo-bar");
    assert_eq!(*seen.lock().unwrap(), vec!["foo".to_string(), "bar".to_string()]);
}

#[test]
fn test_positional_captures_stay_strings() {
    let table = RouteTable::builder()
        .get(
            Route::positional(r"^/n/([0-9]+)/$", |ctx: &mut Context, n: String| ctx.write(n)).unwrap(),
        )
        .build();
    let (_, response) = Dispatcher::new(table).handle(request("GET", "/n/007/"));
    assert_eq!(response.body(), b"007");
}

#[test]
fn test_positional_arity_mismatch_fails_at_registration() {
    let err = Route::positional(r"^/a/([a-z]+)/([a-z]+)/$", |_ctx: &mut Context, _one: String| {}).unwrap_err();
    assert!(matches!(err, RouteError::ArityMismatch { groups: 2, params: 1, .. }));
}

#[test]
fn test_wildcard_matches_everything_without_redirect() {
    let table = RouteTable::builder()
        .get(Route::wildcard(|ctx: &mut Context| ctx.write("fallback")))
        .build();

    for path in ["", "/", "nope", "/a//b/../c", "/%zz/ünï"] {
        assert!(
            matches!(table.select("GET", path, None), Selection::Execute(_)),
            "wildcard should execute for {path:?}"
        );
    }

    let (outcome, response) = Dispatcher::new(table).handle(request("GET", "/x/./y"));
    assert_eq!(outcome, Outcome::Executed);
    assert_eq!(response.body(), b"fallback");
}

#[test]
fn test_unregistered_method_is_not_found() {
    let table = RouteTable::builder()
        .get(Route::wildcard(|_ctx: &mut Context| {}))
        .build();
    let dispatcher = Dispatcher::new(table);

    for method in ["PATCH", "POST", "DELETE"] {
        let (outcome, response) = dispatcher.handle(request(method, "/"));
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[test]
fn test_static_route_is_exact() {
    let table = RouteTable::builder()
        .get(Route::exact("/about/", |ctx: &mut Context| ctx.write("about")))
        .build();
    let dispatcher = Dispatcher::new(table);

    let (outcome, response) = dispatcher.handle(request("GET", "/about/"));
    assert_eq!(outcome, Outcome::Executed);
    assert_eq!(response.body(), b"about");

    assert_eq!(dispatcher.handle(request("GET", "/about")).0, Outcome::NotFound);
    assert_eq!(dispatcher.handle(request("GET", "/About/")).0, Outcome::NotFound);
}

#[test]
fn test_first_registered_route_wins() {
    let table = RouteTable::builder()
        .get(Route::regex(r"^/items/(?P<id>[^/]+)/$", |ctx: &mut Context| ctx.write("regex")).unwrap())
        .get(Route::exact("/items/new/", |ctx: &mut Context| ctx.write("static")))
        .get(Route::wildcard(|ctx: &mut Context| ctx.write("wildcard")))
        .build();
    let dispatcher = Dispatcher::new(table);

    let (_, response) = dispatcher.handle(request("GET", "/items/new/"));
    assert_eq!(response.body(), b"regex");

    let (_, response) = dispatcher.handle(request("GET", "/other/"));
    assert_eq!(response.body(), b"wildcard");
}

#[test]
fn test_exactly_one_route_executes() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let record = |name: &'static str| {
        let calls = Arc::clone(&calls);
        move |_ctx: &mut Context| calls.lock().unwrap().push(name)
    };
    let table = RouteTable::builder()
        .get(Route::exact("/", record("home")))
        .get(Route::regex("^/.*$", record("any")).unwrap())
        .get(Route::wildcard(record("wildcard")))
        .build();
    let dispatcher = Dispatcher::new(table);

    dispatcher.handle(request("GET", "/"));
    dispatcher.handle(request("GET", "/x/"));
    assert_eq!(*calls.lock().unwrap(), vec!["home", "any"]);
}

#[test]
fn test_add_registers_under_every_method() {
    let table = RouteTable::builder()
        .add(Route::exact("/", |_ctx: &mut Context| {}), &["GET", "head", "Post"])
        .unwrap()
        .build();
    assert_eq!(table.len(), 3);
    for method in [Method::Get, Method::Head, Method::Post] {
        assert_eq!(table.routes(method).len(), 1);
        assert_eq!(table.routes(method)[0].path(), "/");
    }
    assert!(table.routes(Method::Put).is_empty());

    let err = RouteTable::builder()
        .add(Route::wildcard(|_ctx: &mut Context| {}), &["GET", "PATCH"])
        .unwrap_err();
    assert!(matches!(err, RouteError::UnknownMethod(ref m) if m == "PATCH"));
}

#[test]
fn test_malformed_pattern_fails_at_construction() {
    let err = Route::regex("^/users/(?P<id>[0-9+/$", |_ctx: &mut Context| {}).unwrap_err();
    assert!(matches!(err, RouteError::InvalidPattern { .. }));
}

#[test]
fn test_replaced_table_serves_new_routes() {
    let dispatcher = Dispatcher::new(RouteTable::builder().build());
    assert_eq!(dispatcher.handle(request("GET", "/")).0, Outcome::NotFound);

    dispatcher.replace(
        RouteTable::builder()
            .get(Route::exact("/", |ctx: &mut Context| ctx.write("home")))
            .build(),
    );
    let (outcome, response) = dispatcher.handle(request("GET", "/"));
    assert_eq!(outcome, Outcome::Executed);
    assert_eq!(response.body(), b"home");
}

#[test]
fn test_regex_claims_non_canonical_spelling_before_wildcard() {
    let table = RouteTable::builder()
        .get(Route::regex(r"^/users/(?P<id>[0-9]+)/$", |ctx: &mut Context| ctx.write("user")).unwrap())
        .get(Route::wildcard(|ctx: &mut Context| ctx.write("fallback")))
        .build();
    let dispatcher = Dispatcher::new(table);

    let (outcome, _) = dispatcher.handle(request("GET", "/users/42"));
    assert_eq!(outcome, Outcome::Redirect("/users/42/".to_string()));

    let (_, response) = dispatcher.handle(request("GET", "/users/abc"));
    assert_eq!(response.body(), b"fallback");
}
