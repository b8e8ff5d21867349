use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::warn;

use super::request::{find_header, HeaderVec};
use crate::error::reason_phrase;

/// Upper bound on distinct header lines kept for the wire writer.
const MAX_INTERNED_HEADER_LINES: usize = 65_536;

/// Headers whose values routinely carry client input and are never cached.
const UNCACHED_HEADERS: &[&str] = &["Location"];

/// Lines leaked without going through the table.
static UNCACHED_LINES: AtomicUsize = AtomicUsize::new(0);

/// `may_minihttp` only accepts `&'static str` header lines.
///
/// Each distinct `Name: value` line is leaked once and reused afterwards, up
/// to `limit` entries. Lines that bypass the table (uncached names, or any
/// new line once it is full) are still leaked and written, never dropped,
/// and are counted by [`uncached_header_lines`].
struct HeaderLineTable {
    lines: DashMap<String, &'static str>,
    limit: usize,
}

impl HeaderLineTable {
    fn new(limit: usize) -> Self {
        Self {
            lines: DashMap::new(),
            limit,
        }
    }

    fn line(&self, name: &str, value: &str) -> &'static str {
        let line = format!("{name}: {value}");
        if UNCACHED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)) {
            UNCACHED_LINES.fetch_add(1, Ordering::Relaxed);
            return Box::leak(line.into_boxed_str());
        }
        if let Some(existing) = self.lines.get(&line) {
            return *existing;
        }
        if self.lines.len() >= self.limit {
            let total = UNCACHED_LINES.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                header = %name,
                limit = self.limit,
                uncached_total = total,
                "Header line table full, writing uncached line"
            );
            return Box::leak(line.into_boxed_str());
        }
        let leaked: &'static str = Box::leak(line.clone().into_boxed_str());
        *self.lines.entry(line).or_insert(leaked)
    }
}

static HEADER_LINES: Lazy<HeaderLineTable> =
    Lazy::new(|| HeaderLineTable::new(MAX_INTERNED_HEADER_LINES));

/// Number of header lines written without being interned since startup.
///
/// Every such line is a permanent allocation; a steadily rising value points
/// at a high-cardinality header.
#[must_use]
pub fn uncached_header_lines() -> usize {
    UNCACHED_LINES.load(Ordering::Relaxed)
}

/// Outbound response buffered in memory until the dispatcher returns it.
///
/// Once the status has been written the response is *committed*; later
/// attempts to change the status are ignored so a partially written
/// response is never overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: HeaderVec,
    body: Vec<u8>,
    committed: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
            committed: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn committed(&self) -> bool {
        self.committed
    }

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

    /// Body as UTF-8, lossy.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Add or replace a header (case-insensitive name match).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Append a header, keeping existing values with the same name.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Write the status code and commit the response.
    pub fn write_header(&mut self, code: u16) {
        if self.committed {
            warn!(
                status = self.status,
                attempted_status = code,
                "Response already committed"
            );
            return;
        }
        self.status = code;
        self.committed = true;
    }

    /// Append body bytes, committing with 200 first if needed.
    pub fn write(&mut self, bytes: &[u8]) {
        if !self.committed {
            self.write_header(200);
        }
        self.body.extend_from_slice(bytes);
    }
}

/// Copy a [`Response`] onto the `may_minihttp` wire response.
///
/// HEAD responses never carry a body.
pub fn write_response(res: &mut may_minihttp::Response, response: Response, head: bool) {
    res.status_code(response.status as usize, reason_phrase(response.status));
    for (name, value) in &response.headers {
        res.header(HEADER_LINES.line(name, value));
    }
    if head {
        // may_minihttp derives Content-Length from the body it is given and
        // has no way to set it explicitly, so HEAD answers with
        // `Content-Length: 0` rather than the length a GET would report.
        res.body_vec(Vec::new());
    } else {
        res.body_vec(response.body);
    }
}
