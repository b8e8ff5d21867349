//! # Server Module
//!
//! Transport glue between `may_minihttp` and the [`crate::Dispatcher`].
//!
//! - [`Request`] / [`Response`]: owned request and response values the
//!   framework works with, independent of the wire library
//! - [`AppService`]: the `HttpService` that converts, dispatches and writes
//!   back
//! - [`HttpServer`] / [`ServerHandle`]: start, wait for and stop a listener

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{find_header, parse_request, HeaderVec, Request, MAX_INLINE_HEADERS};
pub use response::{uncached_header_lines, write_response, Response};
pub use service::AppService;
