use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use super::radix::{Endpoint, RadixTree};
use super::registry::{Route, RouteRegistry};
use crate::context::Context;
use crate::error::ConfigError;
use crate::middleware::{compose, method_not_allowed_handler, not_found_handler, Handler, HandlerId, Middleware};

/// Every method a route can be registered under, in `Allow` header order.
pub const METHODS: [Method; 9] = [
    Method::CONNECT,
    Method::DELETE,
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

/// Parse a method name from the supported set. Names are case-sensitive.
pub fn parse_method(name: &str) -> Result<Method, ConfigError> {
    METHODS
        .iter()
        .find(|m| m.as_str() == name)
        .cloned()
        .ok_or_else(|| ConfigError::UnsupportedMethod(name.to_string()))
}

/// Outcome of resolving a method and path.
#[derive(Debug)]
pub enum Lookup<'r> {
    Found(&'r Endpoint),
    /// The path matched under these other methods only.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Per-method radix trees plus the flat route registry.
///
/// Registration (`add`) needs `&mut self`; once built, lookups only need
/// `&self` and the router can be shared freely across threads.
#[derive(Debug, Default)]
pub struct Router {
    trees: HashMap<Method, RadixTree>,
    registry: RouteRegistry,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`, with `middleware`
    /// folded around it once, here.
    ///
    /// The registry records the unwrapped handler's id so reverse lookup
    /// works with the handler the caller holds. Registering the same method
    /// and pattern again replaces the previous handler.
    pub fn add(&mut self, method: Method, pattern: &str, handler: Handler, middleware: &[Middleware]) {
        let pattern = normalize_pattern(pattern);
        let id = handler.id();
        let chain = compose(middleware, handler);

        let tree = self.trees.entry(method.clone()).or_default();
        match tree.insert(&pattern, chain) {
            Some(_) => warn!(method = %method, path = %pattern, handler = %id, "Route replaced"),
            None => debug!(method = %method, path = %pattern, handler = %id, "Route registered"),
        }

        self.registry.insert(Route {
            method,
            path: pattern,
            handler: id,
        });
    }

    /// Resolve `path` under `method`, writing captured values into `values`.
    ///
    /// On a miss every other method's tree is consulted so the caller can
    /// tell "method not allowed" apart from "not found".
    pub fn find<'r>(&'r self, method: &Method, path: &str, values: &mut Vec<String>) -> Lookup<'r> {
        values.clear();
        if let Some(endpoint) = self.trees.get(method).and_then(|t| t.find(path, values)) {
            return Lookup::Found(endpoint);
        }

        let mut scratch = Vec::new();
        let allowed: Vec<Method> = METHODS
            .iter()
            .filter(|m| *m != method)
            .filter(|m| {
                scratch.clear();
                self.trees
                    .get(*m)
                    .is_some_and(|t| t.find(path, &mut scratch).is_some())
            })
            .cloned()
            .collect();

        if allowed.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::MethodNotAllowed(allowed)
        }
    }

    /// Resolve the context's request and install the matched handler and
    /// parameters on it. A miss installs the not-found or method-not-allowed
    /// handler; the latter also sets the `Allow` response header.
    pub fn route(&self, ctx: &mut Context) {
        let lookup = self.find(ctx.request.method(), ctx.request.path(), &mut ctx.pvalues);
        match lookup {
            Lookup::Found(endpoint) => {
                ctx.handler = endpoint.handler().clone();
                ctx.pnames = Arc::clone(endpoint.param_names());
            }
            Lookup::MethodNotAllowed(allowed) => {
                debug!(
                    method = %ctx.request.method(),
                    path = %ctx.request.path(),
                    "Path matched under other methods only"
                );
                let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                ctx.response.set_header("Allow", allow);
                ctx.handler = method_not_allowed_handler();
            }
            Lookup::NotFound => {
                debug!(
                    method = %ctx.request.method(),
                    path = %ctx.request.path(),
                    "No route matched"
                );
                ctx.handler = not_found_handler();
            }
        }
    }

    /// Largest parameter count of any registered pattern, across methods.
    #[must_use]
    pub fn max_params(&self) -> usize {
        self.trees.values().map(RadixTree::max_params).max().unwrap_or(0)
    }

    /// Every registered route, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        self.registry.as_slice()
    }

    #[must_use]
    pub fn route_for(&self, method: &Method, path: &str) -> Option<&Route> {
        self.registry.get(method, &normalize_pattern(path))
    }

    /// Reverse lookup: see [`crate::App::uri`].
    #[must_use]
    pub fn uri<P: Display>(&self, handler: HandlerId, params: &[P]) -> String {
        self.registry.uri(handler, params)
    }
}

/// Patterns always start with `/`; an empty pattern means the root.
pub(crate) fn normalize_pattern(pattern: &str) -> String {
    if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{pattern}")
    }
}
