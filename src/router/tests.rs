use std::sync::Arc;

use http::Method;

use super::{parse_method, Lookup, Router, METHODS};
use crate::context::Context;
use crate::error::{ConfigError, HttpError};
use crate::middleware::{method_not_allowed_handler, not_found_handler, Handler, Middleware};
use crate::server::{Request, Response};

fn noop() -> Handler {
    Handler::new(|_| Ok(()))
}

fn routed(router: &Router, method: Method, uri: &str) -> Context {
    let mut ctx = Context::detached();
    ctx.reset(Request::new(method, uri), Response::new());
    router.route(&mut ctx);
    ctx
}

#[test]
fn test_static_routes_have_no_params() {
    let mut router = Router::new();
    let paths = ["/", "/about", "/api/v1/health", "/api/v1/ready"];
    let handlers: Vec<Handler> = paths.iter().map(|_| noop()).collect();
    for (p, h) in paths.iter().zip(&handlers) {
        router.add(Method::GET, p, h.clone(), &[]);
    }
    for (p, h) in paths.iter().zip(&handlers) {
        let ctx = routed(&router, Method::GET, p);
        assert_eq!(ctx.handler().id(), h.id(), "path {p}");
        assert!(ctx.param_values().is_empty());
        assert!(ctx.param_names().is_empty());
    }
}

#[test]
fn test_params_written_to_context() {
    let mut router = Router::new();
    router.add(Method::GET, "/users/:id/posts/:post_id", noop(), &[]);
    let ctx = routed(&router, Method::GET, "/users/42/posts/7?expand=1");
    assert_eq!(ctx.param("id"), Some("42"));
    assert_eq!(ctx.param("post_id"), Some("7"));
    assert_eq!(ctx.param("missing"), None);
}

#[test]
fn test_wildcard_param_name() {
    let mut router = Router::new();
    router.add(Method::GET, "/static/*", noop(), &[]);
    let ctx = routed(&router, Method::GET, "/static/css/site.css");
    assert_eq!(ctx.param("*"), Some("css/site.css"));
}

#[test]
fn test_method_not_allowed_sets_allow_header() {
    let mut router = Router::new();
    router.add(Method::POST, "/items", noop(), &[]);
    router.add(Method::PUT, "/items", noop(), &[]);
    let ctx = routed(&router, Method::GET, "/items");
    assert_eq!(ctx.handler().id(), method_not_allowed_handler().id());
    assert_eq!(ctx.response().header("Allow"), Some("POST, PUT"));
}

#[test]
fn test_not_found() {
    let mut router = Router::new();
    router.add(Method::POST, "/items", noop(), &[]);
    let ctx = routed(&router, Method::GET, "/nothing");
    assert_eq!(ctx.handler().id(), not_found_handler().id());
    assert!(ctx.response().header("Allow").is_none());
}

#[test]
fn test_method_not_allowed_with_params() {
    let mut router = Router::new();
    router.add(Method::DELETE, "/items/:id", noop(), &[]);
    let mut values = Vec::new();
    match router.find(&Method::GET, "/items/9", &mut values) {
        Lookup::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::DELETE]),
        other => panic!("expected 405, got {other:?}"),
    }
    assert!(values.is_empty());
}

#[test]
fn test_route_middleware_folded_at_registration() {
    let mut router = Router::new();
    let tag = Middleware::new(|next| {
        Handler::new(move |ctx| {
            ctx.set("tagged", true);
            next.call(ctx)
        })
    });
    let handler = Handler::new(|ctx| {
        let tagged = ctx.get::<bool>("tagged").copied().unwrap_or(false);
        ctx.string(200, if tagged { "tagged" } else { "plain" })
    });
    router.add(Method::GET, "/t", handler.clone(), &[tag]);

    let mut ctx = routed(&router, Method::GET, "/t");
    // The installed handler is the composed chain, not the raw handler.
    assert_ne!(ctx.handler().id(), handler.id());
    let chain = ctx.handler().clone();
    chain.call(&mut ctx).unwrap();
    assert_eq!(ctx.response().body_string(), "tagged");

    // The registry keeps the caller's handler id for reverse lookup.
    assert_eq!(router.routes()[0].handler, handler.id());
}

#[test]
fn test_patterns_are_normalized() {
    let mut router = Router::new();
    router.add(Method::GET, "", noop(), &[]);
    router.add(Method::GET, "users", noop(), &[]);
    assert!(router.route_for(&Method::GET, "/").is_some());
    assert!(router.route_for(&Method::GET, "/users").is_some());
    let ctx = routed(&router, Method::GET, "/users");
    assert_ne!(ctx.handler().id(), not_found_handler().id());
}

#[test]
fn test_reregistration_last_wins() {
    let mut router = Router::new();
    let first = noop();
    let second = noop();
    router.add(Method::GET, "/x", first, &[]);
    router.add(Method::GET, "/x", second.clone(), &[]);
    assert_eq!(router.routes().len(), 1);
    let ctx = routed(&router, Method::GET, "/x");
    assert_eq!(ctx.handler().id(), second.id());
}

#[test]
fn test_max_params_across_methods() {
    let mut router = Router::new();
    router.add(Method::GET, "/a/:x", noop(), &[]);
    router.add(Method::POST, "/b/:x/:y/:z", noop(), &[]);
    assert_eq!(router.max_params(), 3);
    assert_eq!(Router::new().max_params(), 0);
}

#[test]
fn test_uri_reverse_lookup() {
    let mut router = Router::new();
    let h = noop();
    router.add(Method::GET, "/posts/:id/comments/:cid", h.clone(), &[]);
    assert_eq!(router.uri(h.id(), &["7", "3"]), "/posts/7/comments/3");
    assert_eq!(router.uri(noop().id(), &["7"]), "");
}

#[test]
fn test_parse_method() {
    for m in &METHODS {
        assert_eq!(&parse_method(m.as_str()).unwrap(), m);
    }
    match parse_method("BREW") {
        Err(ConfigError::UnsupportedMethod(m)) => assert_eq!(m, "BREW"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(parse_method("get").is_err());
}

#[test]
fn test_backtracking_through_router() {
    let mut router = Router::new();
    let profile = noop();
    let settings = noop();
    router.add(Method::GET, "/users/new/profile", profile, &[]);
    router.add(Method::GET, "/users/:id/settings", settings.clone(), &[]);
    let ctx = routed(&router, Method::GET, "/users/new/settings");
    assert_eq!(ctx.handler().id(), settings.id());
    assert_eq!(ctx.param("id"), Some("new"));
}

#[test]
fn test_default_handlers_error_with_status() {
    let router = Router::new();
    let mut ctx = routed(&router, Method::GET, "/");
    let handler = ctx.handler().clone();
    let err = handler.call(&mut ctx).unwrap_err();
    assert_eq!(err.downcast_ref::<HttpError>().unwrap().code, 404);
}

#[test]
fn test_concurrent_lookups() {
    let mut router = Router::new();
    router.add(Method::GET, "/users/:id", noop(), &[]);
    router.add(Method::GET, "/files/*", noop(), &[]);
    let router = Arc::new(router);

    let threads: Vec<_> = (0..8)
        .map(|i| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                for j in 0..200 {
                    let ctx = routed(&router, Method::GET, &format!("/users/{i}-{j}"));
                    assert_eq!(ctx.param("id"), Some(format!("{i}-{j}").as_str()));
                    let ctx = routed(&router, Method::GET, &format!("/files/{i}/{j}"));
                    assert_eq!(ctx.param("*"), Some(format!("{i}/{j}").as_str()));
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
}
