//! # Dispatcher Module
//!
//! The [`Dispatcher`] is the single per-request entry point. It is produced
//! by [`crate::App::build`] and is immutable afterwards, so one instance can
//! serve any number of concurrent requests.
//!
//! ## Request flow
//!
//! 1. A context is taken from the pool and reset with the new request
//! 2. `Accept-Language` is parsed once and cached on the context
//! 3. Premiddleware runs, then the router resolves the handler and path
//!    parameters, then global middleware runs around the resolved handler
//!    (whose route middleware was folded in at registration)
//! 4. The chain's result goes to the error handler or the success handler
//! 5. The response is taken out and the context returns to the pool
//!
//! A panic anywhere in the chain is caught, logged, and reported to the error
//! handler as an internal error. The context is returned to the pool on every
//! path.

mod core;

pub use core::{default_error_handler, Dispatcher, ErrorHandler, SuccessHandler};
