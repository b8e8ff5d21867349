//! # Switchyard
//!
//! **Switchyard** is a small HTTP routing and middleware-dispatch engine
//! running on the `may` coroutine runtime.
//!
//! ## Overview
//!
//! - **[`router`]**: per-method radix trees with static, `:param` and `*`
//!   segments, static-first precedence and full backtracking
//! - **[`middleware`]**: handler-wrapping middleware, chain composition and
//!   built-in layers (trailing slash, request logging, metrics)
//! - **[`context`]**: the pooled per-request [`Context`]
//! - **[`dispatcher`]**: the per-request entry point tying it all together
//! - **[`server`]**: request/response types and the `may_minihttp` adapter
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchyard::server::{AppService, HttpServer};
//! use switchyard::{App, Handler};
//!
//! let mut app = App::new();
//! app.get("/hello/:name", Handler::new(|ctx| {
//!     let name = ctx.param("name").unwrap_or("world").to_string();
//!     ctx.string(200, &format!("Hello, {name}!"))
//! }), &[]);
//!
//! let service = AppService::new(Arc::new(app.build()));
//! let handle = HttpServer(service).start("127.0.0.1:8080")?;
//! handle.join().ok();
//! ```
//!
//! ## Request lifecycle
//!
//! Every request runs the same fixed stages: premiddleware, routing, global
//! middleware, route middleware, handler, then the error or success handler.
//! Registration happens on [`App`]; [`App::build`] freezes it into a
//! [`Dispatcher`] that is shared read-only across requests.

pub mod app;
pub mod binder;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod group;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod mime;
pub mod render;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use app::App;
pub use context::Context;
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, HttpError};
pub use group::Group;
pub use middleware::{Handler, HandlerId, HandlerResult, Middleware};
pub use server::{Request, Response};
