//! # Execution Context
//!
//! A [`Context`] is the mutable per-request carrier threaded through every
//! middleware layer and handler. It owns the request and response for the
//! duration of one request, the path parameters resolved by the router, the
//! handler the router picked, and a free-form data bag.
//!
//! Contexts are recycled through a [`ContextPool`]. Every field is reset
//! before a context is handed to the next request, so nothing leaks from one
//! request into another.

mod pool;

pub use pool::{ContextPool, PooledContext};

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::binder::{Binder, DefaultBinder};
use crate::error::{ConfigError, HttpError};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::{not_found_handler, Handler, HandlerResult};
use crate::mime;
use crate::render::Renderer;
use crate::server::{Request, Response};

/// Framework-wide collaborators shared by every context.
pub(crate) struct Services {
    pub(crate) binder: Arc<dyn Binder>,
    pub(crate) renderer: Option<Arc<dyn Renderer>>,
    pub(crate) debug: bool,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            binder: Arc::new(DefaultBinder),
            renderer: None,
            debug: false,
        }
    }
}

pub struct Context {
    pub(crate) request: Request,
    pub(crate) response: Response,
    pub(crate) pnames: Arc<[String]>,
    pub(crate) pvalues: Vec<String>,
    pub(crate) handler: Handler,
    data: HashMap<String, Box<dyn Any + Send + Sync>>,
    lang: String,
    request_id: RequestId,
    services: Arc<Services>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .field("pnames", &self.pnames)
            .field("pvalues", &self.pvalues)
            .field("handler", &self.handler)
            .field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .field("lang", &self.lang)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Create a fresh context whose parameter storage is pre-sized to
    /// `max_params`.
    pub(crate) fn new(services: Arc<Services>, max_params: usize) -> Self {
        Self {
            request: Request::default(),
            response: Response::new(),
            pnames: Arc::from(Vec::new()),
            pvalues: Vec::with_capacity(max_params),
            handler: not_found_handler(),
            data: HashMap::new(),
            lang: String::new(),
            request_id: RequestId::nil(),
            services,
        }
    }

    /// A standalone context with default services, for driving handlers and
    /// middleware outside a dispatcher.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(Arc::new(Services::default()), 0)
    }

    /// Clear all per-request state and install a new request/response pair.
    pub fn reset(&mut self, request: Request, response: Response) {
        self.request_id = RequestId::from_header_or_new(request.header(REQUEST_ID_HEADER));
        self.request = request;
        self.response = response;
        self.pnames = Arc::from(Vec::new());
        self.pvalues.clear();
        self.handler = not_found_handler();
        self.data.clear();
        self.lang.clear();
    }

    /// Drop the request and response held by an idle context.
    pub(crate) fn clear_handles(&mut self) {
        self.request = Request::default();
        self.response = Response::new();
        self.request_id = RequestId::nil();
    }

    /// Move the response out, leaving a fresh one behind.
    pub fn take_response(&mut self) -> Response {
        std::mem::take(&mut self.response)
    }

    #[inline]
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[inline]
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    #[inline]
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    #[inline]
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.services.debug
    }

    /// Value of a path parameter by name. For a wildcard route the remainder
    /// is bound to `"*"`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.pnames
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.pvalues.get(i))
            .map(String::as_str)
    }

    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.pnames
    }

    #[must_use]
    pub fn param_values(&self) -> &[String] {
        &self.pvalues
    }

    pub fn set_param_names(&mut self, names: Vec<String>) {
        self.pnames = Arc::from(names);
    }

    pub fn set_param_values(&mut self, values: Vec<String>) {
        self.pvalues.clear();
        self.pvalues.extend(values);
    }

    /// The handler resolved by the router (not-found until routing runs).
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn set_handler(&mut self, handler: Handler) {
        self.handler = handler;
    }

    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.data.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), Box::new(value));
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Preferred language tag, empty when the client sent none.
    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Parse an `Accept-Language` header value and keep its preferred tag.
    pub fn set_lang(&mut self, accept_language: Option<&str>) {
        self.lang.clear();
        if let Some(tag) = accept_language.and_then(preferred_language) {
            self.lang.push_str(tag);
        }
    }

    /// Cache the preferred tag of the current request's `Accept-Language`.
    pub(crate) fn negotiate_lang(&mut self) {
        self.lang.clear();
        if let Some(tag) = self.request.header("Accept-Language").and_then(preferred_language) {
            self.lang.push_str(tag);
        }
    }

    pub fn string(&mut self, code: u16, body: &str) -> HandlerResult {
        self.blob(code, mime::TEXT_PLAIN_UTF8, body.as_bytes())
    }

    pub fn html(&mut self, code: u16, body: &str) -> HandlerResult {
        self.blob(code, mime::TEXT_HTML_UTF8, body.as_bytes())
    }

    pub fn json<T: Serialize + ?Sized>(&mut self, code: u16, value: &T) -> HandlerResult {
        let body = serde_json::to_vec(value)?;
        self.blob(code, mime::APPLICATION_JSON_UTF8, &body)
    }

    pub fn blob(&mut self, code: u16, content_type: &str, body: &[u8]) -> HandlerResult {
        self.response.set_header("Content-Type", content_type);
        self.response.write_header(code);
        self.response.write(body);
        Ok(())
    }

    pub fn no_content(&mut self, code: u16) -> HandlerResult {
        self.response.write_header(code);
        Ok(())
    }

    /// Redirect to `url`. Only 300..=308 are accepted.
    pub fn redirect(&mut self, code: u16, url: &str) -> HandlerResult {
        if !(300..=308).contains(&code) {
            return Err(ConfigError::InvalidRedirectCode(code).into());
        }
        self.response.set_header("Location", url);
        self.response.write_header(code);
        Ok(())
    }

    /// Decode the request body into `T` through the configured binder.
    pub fn bind<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let value = self.services.binder.bind(&self.request)?;
        serde_json::from_value(value)
            .map_err(|e| anyhow::Error::from(HttpError::bad_request().with_message(e.to_string())))
    }

    /// Render the named template with `data` through the configured renderer.
    pub fn render<T: Serialize + ?Sized>(&mut self, code: u16, name: &str, data: &T) -> HandlerResult {
        let Some(renderer) = self.services.renderer.as_ref().map(Arc::clone) else {
            return Err(ConfigError::RendererNotRegistered.into());
        };
        let data = serde_json::to_value(data)?;
        let mut out = Vec::new();
        renderer.render(&mut out, name, &data)?;
        self.blob(code, mime::TEXT_HTML_UTF8, &out)
    }
}

/// Pick the tag with the highest q-value; ties keep the first listed.
fn preferred_language(header: &str) -> Option<&str> {
    let mut best: Option<(&str, f32)> = None;
    for part in header.split(',') {
        let mut pieces = part.split(';');
        let tag = pieces.next().unwrap_or_default().trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }
        let q = pieces
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);
        if q <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, bq)| q > bq) {
            best = Some((tag, q));
        }
    }
    best.map(|(tag, _)| tag)
}
