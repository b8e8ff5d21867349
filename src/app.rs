//! # App
//!
//! [`App`] is the registration surface: routes, middleware, handlers and
//! collaborators are configured here, then [`App::build`] freezes everything
//! into a [`Dispatcher`].
//!
//! ```rust,ignore
//! use switchyard::{App, Handler};
//! use switchyard::middleware::{remove_trailing_slash, request_logger};
//!
//! let mut app = App::new();
//! app.pre([remove_trailing_slash()]);
//! app.use_middleware([request_logger()]);
//!
//! let show = Handler::new(|ctx| {
//!     let id = ctx.param("id").unwrap_or_default().to_string();
//!     ctx.string(200, &id)
//! });
//! app.get("/users/:id", show.clone(), &[]);
//!
//! assert_eq!(app.uri(show.id(), &["42"]), "/users/42");
//! let dispatcher = app.build();
//! ```

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::binder::{Binder, DefaultBinder};
use crate::context::{Context, Services};
use crate::dispatcher::{default_error_handler, Dispatcher, ErrorHandler, SuccessHandler};
use crate::error::ConfigError;
use crate::group::Group;
use crate::middleware::{Handler, HandlerId, Middleware};
use crate::render::Renderer;
use crate::router::{parse_method, Route, Router, METHODS};

/// Generates the per-method registration helpers on a type with a
/// `route(Method, &str, Handler, &[Middleware])` method.
macro_rules! method_helpers {
    ($($(#[$doc:meta])* $name:ident => $method:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, path: &str, handler: Handler, middleware: &[Middleware]) -> &mut Self {
                self.route(Method::$method, path, handler, middleware);
                self
            }
        )*
    };
}
pub(crate) use method_helpers;

pub struct App {
    router: Router,
    premiddleware: Vec<Middleware>,
    middleware: Vec<Middleware>,
    error_handler: ErrorHandler,
    success_handler: Option<SuccessHandler>,
    binder: Arc<dyn Binder>,
    renderer: Option<Arc<dyn Renderer>>,
    debug: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.router.routes().len())
            .field("premiddleware", &self.premiddleware.len())
            .field("middleware", &self.middleware.len())
            .field("renderer", &self.renderer.is_some())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            premiddleware: Vec::new(),
            middleware: Vec::new(),
            error_handler: Arc::new(default_error_handler),
            success_handler: None,
            binder: Arc::new(DefaultBinder),
            renderer: None,
            debug: false,
        }
    }

    /// Append middleware that runs before routing.
    pub fn pre(&mut self, middleware: impl IntoIterator<Item = Middleware>) -> &mut Self {
        self.premiddleware.extend(middleware);
        self
    }

    /// Append middleware that runs after routing, around every resolved
    /// handler (including the not-found and method-not-allowed ones).
    pub fn use_middleware(&mut self, middleware: impl IntoIterator<Item = Middleware>) -> &mut Self {
        self.middleware.extend(middleware);
        self
    }

    pub(crate) fn route(&mut self, method: Method, path: &str, handler: Handler, middleware: &[Middleware]) {
        self.router.add(method, path, handler, middleware);
    }

    /// Register a route under a method given by name.
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

    /// Register the route under every supported method.
    pub fn any(&mut self, path: &str, handler: Handler, middleware: &[Middleware]) -> &mut Self {
        for method in METHODS {
            self.route(method, path, handler.clone(), middleware);
        }
        self
    }

    /// Register the route under each listed method. Nothing is registered if
    /// any name is unsupported.
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

    /// Start a route group under `prefix`. Its middleware runs before any
    /// route-level middleware of the routes added through it.
    pub fn group(&mut self, prefix: &str, middleware: &[Middleware]) -> Group<'_> {
        Group::new(self, prefix.to_string(), middleware.to_vec())
    }

    pub fn set_error_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(anyhow::Error, &mut Context) + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    pub fn set_success_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.success_handler = Some(Arc::new(handler));
        self
    }

    pub fn set_binder(&mut self, binder: impl Binder + 'static) -> &mut Self {
        self.binder = Arc::new(binder);
        self
    }

    pub fn set_renderer(&mut self, renderer: impl Renderer + 'static) -> &mut Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// In debug mode the default error handler shows internal error messages
    /// instead of a generic 500 body.
    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Every registered route, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        self.router.routes()
    }

    /// Build a URI for the first route registered with `handler`,
    /// substituting its `:name` segments with `params` in order. Returns an
    /// empty string when the handler was never registered.
    #[must_use]
    pub fn uri<P: fmt::Display>(&self, handler: HandlerId, params: &[P]) -> String {
        self.router.uri(handler, params)
    }

    /// Alias for [`App::uri`].
    #[must_use]
    pub fn url<P: fmt::Display>(&self, handler: HandlerId, params: &[P]) -> String {
        self.uri(handler, params)
    }

    /// Freeze registration and compose the middleware chains.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        let services = Services {
            binder: self.binder,
            renderer: self.renderer,
            debug: self.debug,
        };
        Dispatcher::new(
            self.router,
            &self.premiddleware,
            &self.middleware,
            services,
            self.error_handler,
            self.success_handler,
        )
    }
}
