//! # Router Module
//!
//! Resolves a request method and path to a registered handler and the path
//! parameters captured along the way.
//!
//! ## Pattern syntax
//!
//! - static text is matched byte for byte
//! - `:name` matches one non-empty path segment and binds it to `name`
//! - `*` matches the rest of the path, slashes included, and binds it to
//!   `"*"`; anything after it in the pattern is ignored
//!
//! ## Precedence
//!
//! At every branching point static children are tried first, then the
//! parameter child, then the wildcard child. If a branch dead-ends deeper
//! down, matching backtracks and tries the next alternative, at any level.
//!
//! ## Example
//!
//! ```rust,ignore
//! use switchyard::router::{Lookup, Router};
//!
//! let mut router = Router::new();
//! router.add(Method::GET, "/users/:id", handler, &[]);
//!
//! let mut values = Vec::new();
//! match router.find(&Method::GET, "/users/42", &mut values) {
//!     Lookup::Found(endpoint) => assert_eq!(values, ["42"]),
//!     Lookup::MethodNotAllowed(allowed) => println!("allow: {allowed:?}"),
//!     Lookup::NotFound => println!("404"),
//! }
//! ```
//!
//! Each method has its own tree. A miss under the request's method is
//! checked against the other trees to report 405 instead of 404.

mod core;
mod radix;
mod registry;
#[cfg(test)]
mod tests;

pub use core::{parse_method, Lookup, Router, METHODS};
pub(crate) use core::normalize_pattern;
pub use radix::{Endpoint, RadixTree, WILDCARD_PARAM};
pub use registry::Route;
