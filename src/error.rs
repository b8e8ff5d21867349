//! Error shapes produced and recognized by the framework.
//!
//! Handlers return `anyhow::Error`. The only concrete shape the default error
//! handler understands is [`HttpError`]; anything else becomes a 500.

use std::fmt;

use http::StatusCode;

/// An error carrying an HTTP status code and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// HTTP status code (404, 405, ...)
    pub code: u16,
    /// Message written to the response body
    pub message: String,
}

impl HttpError {
    /// Create an error whose message is the canonical reason phrase for `code`.
    #[must_use]
    pub fn new(code: u16) -> Self {
        Self {
            code,
            message: reason_phrase(code).to_string(),
        }
    }

    /// Replace the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn bad_request() -> Self {
        Self::new(400)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(401)
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(404)
    }

    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(405)
    }

    #[must_use]
    pub fn payload_too_large() -> Self {
        Self::new(413)
    }

    #[must_use]
    pub fn unsupported_media_type() -> Self {
        Self::new(415)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Setup-time failures, surfaced to whoever is configuring the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The method is not one of the nine registrable HTTP methods
    UnsupportedMethod(String),
    /// Redirects must use a 3xx code between 300 and 308
    InvalidRedirectCode(u16),
    /// `Context::render` was called without a renderer installed
    RendererNotRegistered,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedMethod(method) => {
                write!(f, "unsupported HTTP method '{method}'")
            }
            ConfigError::InvalidRedirectCode(code) => {
                write!(f, "invalid redirect status code {code}")
            }
            ConfigError::RendererNotRegistered => f.write_str("renderer not registered"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Canonical reason phrase for a status code, `"Unknown"` when there is none.
#[must_use]
pub fn reason_phrase(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}
