//! # Middleware
//!
//! A [`Middleware`] wraps a [`Handler`] and returns a new one. Chains are
//! built with [`compose`], which folds a list so that the first-declared
//! layer runs outermost.
//!
//! Built-in layers:
//!
//! - [`add_trailing_slash`] / [`remove_trailing_slash`]: path normalization,
//!   usually registered with [`crate::App::pre`] so it runs before routing
//! - [`request_logger`]: one `tracing` span and completion event per request
//! - [`MetricsMiddleware`]: request counters and latency, via [`Hooks`]

mod core;
mod metrics;
mod slash;
mod tracing;

pub use core::{compose, wrap_middleware, Handler, HandlerId, HandlerResult, Hooks, Middleware};
pub use metrics::MetricsMiddleware;
pub use slash::{
    add_trailing_slash, add_trailing_slash_with_config, remove_trailing_slash,
    remove_trailing_slash_with_config, Skipper, TrailingSlashConfig,
};
pub use tracing::request_logger;

use once_cell::sync::Lazy;

use crate::error::HttpError;

static NOT_FOUND: Lazy<Handler> = Lazy::new(|| Handler::new(|_| Err(HttpError::not_found().into())));

static METHOD_NOT_ALLOWED: Lazy<Handler> =
    Lazy::new(|| Handler::new(|_| Err(HttpError::method_not_allowed().into())));

/// Handler installed when no route matches the request path. Always returns
/// the same handler identity.
#[must_use]
pub fn not_found_handler() -> Handler {
    NOT_FOUND.clone()
}

/// Handler installed when the path matches under another method only.
#[must_use]
pub fn method_not_allowed_handler() -> Handler {
    METHOD_NOT_ALLOWED.clone()
}
