use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use http::Method;
use tracing::{debug, error, info, warn};

use crate::context::{Context, ContextPool, Services};
use crate::error::{reason_phrase, HttpError};
use crate::middleware::{compose, Handler, HandlerId, Middleware};
use crate::router::{Route, Router};
use crate::server::{Request, Response};

/// Turns an error returned by the chain into a response.
pub type ErrorHandler = Arc<dyn Fn(anyhow::Error, &mut Context) + Send + Sync>;

/// Runs after a chain that returned `Ok`.
pub type SuccessHandler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Default error handler.
///
/// An [`HttpError`] keeps its code and message. Anything else is a 500 whose
/// body is the generic reason phrase, or the error's own message when debug
/// mode is on. HEAD requests get the status only. Nothing is written if the
/// response has already been committed.
pub fn default_error_handler(err: anyhow::Error, ctx: &mut Context) {
    let (code, message) = match err.downcast_ref::<HttpError>() {
        Some(http_err) => (http_err.code, http_err.message.clone()),
        None if ctx.is_debug() => (500, err.to_string()),
        None => (500, reason_phrase(500).to_string()),
    };

    if code >= 500 {
        error!(request_id = %ctx.request_id(), status = code, error = %err, "Request failed");
    } else {
        debug!(request_id = %ctx.request_id(), status = code, error = %err, "Request rejected");
    }

    if ctx.response().committed() {
        warn!(
            request_id = %ctx.request_id(),
            status = ctx.response().status(),
            error_status = code,
            "Response already committed, error not written"
        );
        return;
    }

    let written = if ctx.request().method() == Method::HEAD {
        ctx.no_content(code)
    } else {
        ctx.string(code, &message)
    };
    if let Err(e) = written {
        error!(request_id = %ctx.request_id(), error = %e, "Failed to write error response");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Frozen routing table, middleware chains and context pool.
pub struct Dispatcher {
    router: Arc<Router>,
    chain: Handler,
    pool: ContextPool,
    error_handler: ErrorHandler,
    success_handler: Option<SuccessHandler>,
}

impl Dispatcher {
    pub(crate) fn new(
        router: Router,
        premiddleware: &[Middleware],
        middleware: &[Middleware],
        services: Services,
        error_handler: ErrorHandler,
        success_handler: Option<SuccessHandler>,
    ) -> Self {
        let router = Arc::new(router);
        let max_params = router.max_params();

        // Global middleware wraps whatever handler the router installed.
        let resolved = Handler::new(|ctx: &mut Context| {
            let handler = ctx.handler().clone();
            handler.call(ctx)
        });
        let global = compose(middleware, resolved);

        let routing = {
            let router = Arc::clone(&router);
            Handler::new(move |ctx: &mut Context| {
                router.route(ctx);
                global.call(ctx)
            })
        };
        let chain = compose(premiddleware, routing);

        info!(
            routes = router.routes().len(),
            max_params,
            premiddleware = premiddleware.len(),
            middleware = middleware.len(),
            debug = services.debug,
            "Dispatcher built"
        );

        Self {
            router,
            chain,
            pool: ContextPool::new(Arc::new(services), max_params),
            error_handler,
            success_handler,
        }
    }

    /// Handle one request with a fresh response.
    pub fn serve(&self, request: Request) -> Response {
        self.handle(request, Response::new())
    }

    /// Handle one request, writing into `response`, and hand the response
    /// back once every stage has run.
    pub fn handle(&self, request: Request, response: Response) -> Response {
        let mut ctx = self.pool.acquire();
        ctx.reset(request, response);
        ctx.negotiate_lang();

        let result = match catch_unwind(AssertUnwindSafe(|| self.chain.call(&mut *ctx))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    request_id = %ctx.request_id(),
                    method = %ctx.request().method(),
                    path = %ctx.request().path(),
                    panic_message = %message,
                    "Handler panicked"
                );
                Err(anyhow::anyhow!("handler panicked: {message}"))
            }
        };

        match result {
            Ok(()) => {
                if let Some(on_success) = &self.success_handler {
                    on_success(&mut *ctx);
                }
            }
            Err(err) => (self.error_handler)(err, &mut *ctx),
        }

        ctx.take_response()
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        self.router.routes()
    }

    /// Reverse lookup: see [`crate::App::uri`].
    #[must_use]
    pub fn uri<P: fmt::Display>(&self, handler: HandlerId, params: &[P]) -> String {
        self.router.uri(handler, params)
    }

    #[must_use]
    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.routes().len())
            .field("max_params", &self.pool.max_params())
            .field("idle_contexts", &self.pool.idle())
            .finish_non_exhaustive()
    }
}
