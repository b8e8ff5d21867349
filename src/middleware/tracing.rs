use std::time::Instant;

use tracing::{info, info_span, warn};

use super::{Handler, Middleware};

/// Log every request that passes through the chain.
///
/// Opens a `request` span carrying the request id, method and path, then
/// emits one event when the inner chain returns: `info` with the final status
/// and latency on success, `warn` with the error message otherwise.
#[must_use]
pub fn request_logger() -> Middleware {
    Middleware::new(|next: Handler| {
        Handler::new(move |ctx| {
            let span = info_span!(
                "request",
                request_id = %ctx.request_id(),
                method = %ctx.request().method(),
                path = %ctx.request().path(),
            );
            let _entered = span.enter();

            let start = Instant::now();
            let result = next.call(ctx);
            let latency_us = start.elapsed().as_micros() as u64;

            match &result {
                Ok(()) => info!(
                    status = ctx.response().status(),
                    latency_us,
                    "Request completed"
                ),
                Err(e) => warn!(error = %e, latency_us, "Request failed"),
            }
            result
        })
    })
}
