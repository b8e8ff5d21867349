use http::Method;

use crate::app::{method_helpers, App};
use crate::error::ConfigError;
use crate::middleware::{Handler, Middleware};
use crate::router::{parse_method, METHODS};

/// Routes sharing a path prefix and a middleware list.
///
/// Group middleware is prepended to each route's own middleware, so it runs
/// first. Groups nest: a child group extends both the prefix and the
/// middleware of its parent.
pub struct Group<'a> {
    app: &'a mut App,
    prefix: String,
    middleware: Vec<Middleware>,
}

impl<'a> Group<'a> {
    pub(crate) fn new(app: &'a mut App, prefix: String, middleware: Vec<Middleware>) -> Self {
        Self {
            app,
            prefix,
            middleware,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Add middleware for routes registered on this group from now on.
    pub fn use_middleware(&mut self, middleware: impl IntoIterator<Item = Middleware>) -> &mut Self {
        self.middleware.extend(middleware);
        self
    }

    fn route(&mut self, method: Method, path: &str, handler: Handler, middleware: &[Middleware]) {
        let path = join_path(&self.prefix, path);
        let chain: Vec<Middleware> = self.middleware.iter().chain(middleware).cloned().collect();
        self.app.route(method, &path, handler, &chain);
    }

    pub fn add(
        &mut self,
        method: &str,
        path: &str,
        handler: Handler,
        middleware: &[Middleware],
    ) -> Result<&mut Self, ConfigError> {
        let method = parse_method(method)?;
        self.route(method, path, handler, middleware);
        Ok(self)
    }

    method_helpers! {
        connect => CONNECT,
        delete => DELETE,
        get => GET,
        head => HEAD,
        options => OPTIONS,
        patch => PATCH,
        post => POST,
        put => PUT,
        trace => TRACE,
    }

    pub fn any(&mut self, path: &str, handler: Handler, middleware: &[Middleware]) -> &mut Self {
        for method in METHODS {
            self.route(method, path, handler.clone(), middleware);
        }
        self
    }

    pub fn match_methods(
        &mut self,
        methods: &[&str],
        path: &str,
        handler: Handler,
        middleware: &[Middleware],
    ) -> Result<&mut Self, ConfigError> {
        let methods = methods
            .iter()
            .map(|m| parse_method(m))
            .collect::<Result<Vec<_>, _>>()?;
        for method in methods {
            self.route(method, path, handler.clone(), middleware);
        }
        Ok(self)
    }

    /// Start a nested group.
    pub fn group(&mut self, prefix: &str, middleware: &[Middleware]) -> Group<'_> {
        let prefix = join_path(&self.prefix, prefix);
        let chain = self.middleware.iter().chain(middleware).cloned().collect();
        Group::new(&mut *self.app, prefix, chain)
    }
}

/// Append `path` to `prefix`, inserting a `/` when `path` lacks one.
fn join_path(prefix: &str, path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}
