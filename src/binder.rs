//! Request body binding.
//!
//! A [`Binder`] turns a request body into a `serde_json::Value`, which
//! [`crate::Context::bind`] then deserializes into the caller's type.

use serde_json::{Map, Value};

use crate::error::HttpError;
use crate::mime;
use crate::server::Request;

pub trait Binder: Send + Sync {
    fn bind(&self, req: &Request) -> anyhow::Result<Value>;
}

/// Accepts JSON and URL-encoded form bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBinder;

impl Binder for DefaultBinder {
    fn bind(&self, req: &Request) -> anyhow::Result<Value> {
        if req.body().is_empty() {
            return Err(HttpError::bad_request()
                .with_message("Request body can't be empty")
                .into());
        }

        let content_type = req.header("Content-Type").unwrap_or_default();
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            mime::APPLICATION_JSON => serde_json::from_slice(req.body()).map_err(|e| {
                anyhow::Error::from(
                    HttpError::bad_request().with_message(format!("Malformed JSON body: {e}")),
                )
            }),
            mime::APPLICATION_FORM => {
                let fields: Map<String, Value> = url::form_urlencoded::parse(req.body())
                    .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                    .collect();
                Ok(Value::Object(fields))
            }
            _ => Err(HttpError::unsupported_media_type().into()),
        }
    }
}
