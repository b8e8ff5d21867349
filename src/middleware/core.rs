use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::Context;

/// Outcome of a handler or middleware layer.
pub type HandlerResult = Result<(), anyhow::Error>;

type HandlerFn = dyn Fn(&mut Context) -> HandlerResult + Send + Sync;
type MiddlewareFn = dyn Fn(Handler) -> Handler + Send + Sync;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a handler, assigned when the handler is created.
///
/// Cloning a [`Handler`] keeps its id, so registering the same handler under
/// several routes lets [`crate::App::uri`] find the first of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// A request handler: the terminal function of a chain, or a chain itself.
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    func: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            id: HandlerId::next(),
            func: Arc::new(f),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    #[inline]
    pub fn call(&self, ctx: &mut Context) -> HandlerResult {
        (self.func)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id).finish()
    }
}

/// A handler factory: takes the next handler in the chain and returns a
/// handler wrapping it.
#[derive(Clone)]
pub struct Middleware(Arc<MiddlewareFn>);

impl Middleware {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wrap `next` with this layer.
    #[must_use]
    pub fn apply(&self, next: Handler) -> Handler {
        (self.0)(next)
    }

    /// Adapt a [`Hooks`] implementation into a wrapping middleware.
    pub fn from_hooks<H>(hooks: Arc<H>) -> Self
    where
        H: Hooks + 'static,
    {
        Self::new(move |next| {
            let hooks = Arc::clone(&hooks);
            Handler::new(move |ctx| {
                if let Err(e) = hooks.before(ctx) {
                    let result = Err(e);
                    hooks.after(ctx, &result, Duration::ZERO);
                    return result;
                }
                let start = Instant::now();
                let result = next.call(ctx);
                hooks.after(ctx, &result, start.elapsed());
                result
            })
        })
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

/// Before/after style middleware.
///
/// `before` may short-circuit the chain by returning an error. `after` always
/// runs and sees the chain's result together with the time spent inside it.
pub trait Hooks: Send + Sync {
    fn before(&self, _ctx: &mut Context) -> HandlerResult {
        Ok(())
    }
    fn after(&self, _ctx: &mut Context, _result: &HandlerResult, _latency: Duration) {}
}

/// Fold `middleware` around `terminal`.
///
/// The list is folded from last to first, so `middleware[0]` ends up as the
/// outermost layer and runs first.
#[must_use]
pub fn compose(middleware: &[Middleware], terminal: Handler) -> Handler {
    middleware
        .iter()
        .rev()
        .fold(terminal, |next, mw| mw.apply(next))
}

/// Turn a plain handler into a middleware that runs it before the rest of
/// the chain. An error from the handler stops the chain.
#[must_use]
pub fn wrap_middleware(handler: Handler) -> Middleware {
    Middleware::new(move |next| {
        let handler = handler.clone();
        Handler::new(move |ctx| {
            handler.call(ctx)?;
            next.call(ctx)
        })
    })
}
