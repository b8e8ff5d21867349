use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::{Context, Services};

/// Free list of recycled [`Context`] values.
///
/// Every context created by the pool has its parameter storage pre-sized to
/// the largest parameter count of any registered route. That count is fixed
/// when the app is built, which is why routes cannot be added once serving
/// has begun.
pub struct ContextPool {
    free: Mutex<Vec<Context>>,
    services: Arc<Services>,
    max_params: usize,
}

impl ContextPool {
    pub(crate) fn new(services: Arc<Services>, max_params: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            services,
            max_params,
        }
    }

    /// Parameter capacity given to every new context.
    #[must_use]
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Number of idle contexts waiting for reuse.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Take a context from the free list, creating one if it is empty.
    ///
    /// The returned guard puts the context back when dropped, on every exit
    /// path including unwinding. Callers must still [`Context::reset`] it
    /// before use.
    pub fn acquire(&self) -> PooledContext<'_> {
        let recycled = self.free.lock().pop();
        let ctx = recycled.unwrap_or_else(|| {
            debug!(max_params = self.max_params, "Allocating new context");
            Context::new(Arc::clone(&self.services), self.max_params)
        });
        PooledContext {
            pool: self,
            ctx: Some(ctx),
        }
    }

    fn release(&self, mut ctx: Context) {
        ctx.clear_handles();
        self.free.lock().push(ctx);
    }
}

/// A context on loan from a [`ContextPool`].
pub struct PooledContext<'a> {
    pool: &'a ContextPool,
    ctx: Option<Context>,
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        // Only `drop` takes the context out.
        self.ctx.as_ref().unwrap_or_else(|| unreachable!("pooled context already released"))
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx.as_mut().unwrap_or_else(|| unreachable!("pooled context already released"))
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{not_found_handler, Handler};
    use crate::server::{Request, Response};
    use http::Method;

    fn pool(max_params: usize) -> ContextPool {
        ContextPool::new(Arc::new(Services::default()), max_params)
    }

    #[test]
    fn test_new_context_is_presized() {
        let pool = pool(4);
        let ctx = pool.acquire();
        assert!(ctx.pvalues.capacity() >= 4);
        assert!(ctx.param_values().is_empty());
    }

    #[test]
    fn test_release_on_drop() {
        let pool = pool(0);
        assert_eq!(pool.idle(), 0);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
        }
        assert_eq!(pool.idle(), 2);
        let _c = pool.acquire();
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_reacquired_context_is_clean() {
        let pool = pool(2);
        {
            let mut ctx = pool.acquire();
            ctx.reset(Request::new(Method::GET, "/users/42"), Response::new());
            ctx.set_param_names(vec!["id".into()]);
            ctx.set_param_values(vec!["42".into()]);
            ctx.set("session", 99_u64);
            ctx.set_handler(Handler::new(|_| Ok(())));
        }
        assert_eq!(pool.idle(), 1);

        let mut ctx = pool.acquire();
        ctx.reset(Request::new(Method::GET, "/"), Response::new());
        assert!(ctx.param_values().is_empty());
        assert_eq!(ctx.data_len(), 0);
        assert_eq!(ctx.handler().id(), not_found_handler().id());
    }

    #[test]
    fn test_release_on_panic() {
        let pool = pool(0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ctx = pool.acquire();
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = Arc::new(pool(1));
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let mut ctx = pool.acquire();
                        ctx.reset(Request::new(Method::GET, "/"), Response::new());
                        assert_eq!(ctx.data_len(), 0);
                        ctx.set("owner", (i, j));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert!(pool.idle() <= 8);
    }
}
