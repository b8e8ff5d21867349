use std::io::Read;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;
use tracing::debug;

/// Maximum inline headers before heap allocation.
/// Most requests have ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
///
/// Header names use `Arc<str>` so that names coming from static tables clone
/// in O(1); values are per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Case-insensitive header lookup (RFC 7230).
#[must_use]
pub fn find_header<'a>(headers: &'a HeaderVec, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Inbound request as seen by handlers and middleware.
///
/// The URI is kept alongside its split path and query string so that
/// middleware can rewrite the target in-flight (see [`Request::set_uri`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    uri: String,
    path: String,
    query: String,
    headers: HeaderVec,
    body: Vec<u8>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl Request {
    /// Build a request for `uri` (path plus optional `?query`).
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = split_uri(uri);
        Self {
            method,
            uri: uri.to_string(),
            path,
            query,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request target, path plus query string.
    #[inline]
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string without the leading `?`, empty when absent.
    #[inline]
    #[must_use]
    pub fn query_string(&self) -> &str {
        &self.query
    }

    /// First value of a query parameter, URL-decoded.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replace the request target; path and query are re-derived from it.
    pub fn set_uri(&mut self, uri: &str) {
        let (path, query) = split_uri(uri);
        self.uri.clear();
        self.uri.push_str(uri);
        self.path = path;
        self.query = query;
    }

    /// Replace only the path, keeping the query string.
    pub fn set_path(&mut self, path: &str) {
        self.path.clear();
        self.path.push_str(path);
        self.uri.clear();
        self.uri.push_str(path);
        if !self.query.is_empty() {
            self.uri.push('?');
            self.uri.push_str(&self.query);
        }
    }
}

/// Split a request target into `(path, query)`, dropping any fragment.
fn split_uri(uri: &str) -> (String, String) {
    let uri = uri.split('#').next().unwrap_or_default();
    let (path, query) = match uri.split_once('?') {
        Some((p, q)) => (p, q),
        None => (uri, ""),
    };
    let path = if path.is_empty() { "/" } else { path };
    (path.to_string(), query.to_string())
}

/// Convert a `may_minihttp` request into a [`Request`].
///
/// # Errors
///
/// Returns an error when the method token is not a valid HTTP method.
pub fn parse_request(req: may_minihttp::Request) -> Result<Request, http::method::InvalidMethod> {
    let method = Method::from_bytes(req.method().as_bytes())?;
    let mut request = Request::new(method, req.path());

    for h in req.headers() {
        request.headers.push((
            Arc::from(h.name),
            String::from_utf8_lossy(h.value).into_owned(),
        ));
    }

    let mut body = Vec::new();
    if let Err(e) = req.body().read_to_end(&mut body) {
        debug!(error = %e, "Failed to read request body");
    }
    request.body = body;

    debug!(
        method = %request.method,
        path = %request.path,
        header_count = request.headers.len(),
        body_len = request.body.len(),
        "Request parsed"
    );

    Ok(request)
}
