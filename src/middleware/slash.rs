use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{Handler, Middleware};
use crate::context::Context;

/// Per-request predicate; returning `true` bypasses the middleware.
pub type Skipper = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Configuration shared by the trailing-slash middleware.
#[derive(Clone)]
pub struct TrailingSlashConfig {
    pub skipper: Skipper,
    /// When set, the client is redirected with this status instead of the
    /// request being rewritten in place.
    pub redirect_code: Option<u16>,
}

impl Default for TrailingSlashConfig {
    fn default() -> Self {
        Self {
            skipper: Arc::new(|_| false),
            redirect_code: None,
        }
    }
}

impl fmt::Debug for TrailingSlashConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrailingSlashConfig")
            .field("redirect_code", &self.redirect_code)
            .finish_non_exhaustive()
    }
}

/// Append a trailing slash to the request path. Register with
/// [`crate::App::pre`] so the router sees the normalized path.
#[must_use]
pub fn add_trailing_slash() -> Middleware {
    add_trailing_slash_with_config(TrailingSlashConfig::default())
}

#[must_use]
pub fn add_trailing_slash_with_config(config: TrailingSlashConfig) -> Middleware {
    normalize(config, |path| {
        if path.ends_with('/') {
            None
        } else {
            Some(format!("{path}/"))
        }
    })
}

/// Strip one trailing slash from the request path. The root path is left
/// alone.
#[must_use]
pub fn remove_trailing_slash() -> Middleware {
    remove_trailing_slash_with_config(TrailingSlashConfig::default())
}

#[must_use]
pub fn remove_trailing_slash_with_config(config: TrailingSlashConfig) -> Middleware {
    normalize(config, |path| path.strip_suffix('/').map(str::to_string))
}

fn normalize<F>(config: TrailingSlashConfig, rewrite: F) -> Middleware
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    let rewrite = Arc::new(rewrite);
    Middleware::new(move |next: Handler| {
        let config = config.clone();
        let rewrite = Arc::clone(&rewrite);
        Handler::new(move |ctx| {
            if (config.skipper)(ctx) {
                return next.call(ctx);
            }

            let path = ctx.request().path();
            if path == "/" {
                return next.call(ctx);
            }
            let Some(path) = rewrite(path) else {
                return next.call(ctx);
            };

            let query = ctx.request().query_string();
            let uri = if query.is_empty() {
                path
            } else {
                format!("{path}?{query}")
            };

            if let Some(code) = config.redirect_code {
                debug!(code, location = %uri, "Redirecting to normalized path");
                return ctx.redirect(code, &uri);
            }

            ctx.request_mut().set_uri(&uri);
            next.call(ctx)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{Request, Response};
    use http::Method;
    use parking_lot::Mutex;

    /// Run `mw` around a handler that records the path and uri it saw.
    fn run(mw: &Middleware, uri: &str) -> (Context, Option<(String, String)>) {
        let seen: Arc<Mutex<Option<(String, String)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let chain = mw.apply(Handler::new(move |ctx| {
            *sink.lock() = Some((
                ctx.request().path().to_string(),
                ctx.request().uri().to_string(),
            ));
            Ok(())
        }));
        let mut ctx = Context::detached();
        ctx.reset(Request::new(Method::GET, uri), Response::new());
        chain.call(&mut ctx).unwrap();
        let seen = seen.lock().take();
        (ctx, seen)
    }

    #[test]
    fn test_add_forwards_with_query() {
        let (_, seen) = run(&add_trailing_slash(), "/a?x=1");
        assert_eq!(seen, Some(("/a/".to_string(), "/a/?x=1".to_string())));
    }

    #[test]
    fn test_add_leaves_slashed_path() {
        let (_, seen) = run(&add_trailing_slash(), "/a/");
        assert_eq!(seen, Some(("/a/".to_string(), "/a/".to_string())));
    }

    #[test]
    fn test_remove_forwards() {
        let (_, seen) = run(&remove_trailing_slash(), "/a/");
        assert_eq!(seen, Some(("/a".to_string(), "/a".to_string())));
        let (_, seen) = run(&remove_trailing_slash(), "/a/?q=2");
        assert_eq!(seen, Some(("/a".to_string(), "/a?q=2".to_string())));
    }

    #[test]
    fn test_root_is_never_modified() {
        for mw in [add_trailing_slash(), remove_trailing_slash()] {
            let (_, seen) = run(&mw, "/");
            assert_eq!(seen, Some(("/".to_string(), "/".to_string())));
        }
    }

    #[test]
    fn test_redirect_mode() {
        let mw = add_trailing_slash_with_config(TrailingSlashConfig {
            redirect_code: Some(301),
            ..TrailingSlashConfig::default()
        });
        let (ctx, seen) = run(&mw, "/a?x=1");
        assert!(seen.is_none());
        assert_eq!(ctx.response().status(), 301);
        assert_eq!(ctx.response().header("Location"), Some("/a/?x=1"));
    }

    #[test]
    fn test_invalid_redirect_code_errors() {
        let mw = remove_trailing_slash_with_config(TrailingSlashConfig {
            redirect_code: Some(200),
            ..TrailingSlashConfig::default()
        });
        let chain = mw.apply(Handler::new(|_| Ok(())));
        let mut ctx = Context::detached();
        ctx.reset(Request::new(Method::GET, "/a/"), Response::new());
        assert!(chain.call(&mut ctx).is_err());
    }

    #[test]
    fn test_skipper_bypasses() {
        let mw = add_trailing_slash_with_config(TrailingSlashConfig {
            skipper: Arc::new(|ctx| ctx.request().path().starts_with("/raw")),
            redirect_code: None,
        });
        let (_, seen) = run(&mw, "/raw/file.txt");
        assert_eq!(
            seen,
            Some(("/raw/file.txt".to_string(), "/raw/file.txt".to_string()))
        );
        let (_, seen) = run(&mw, "/other");
        assert_eq!(seen.map(|(p, _)| p), Some("/other/".to_string()));
    }
}
