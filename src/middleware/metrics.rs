use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::{HandlerResult, Hooks};
use crate::context::Context;
use crate::server::uncached_header_lines;

/// Request counters for Prometheus-style scraping.
///
/// Attach with `Middleware::from_hooks(Arc::clone(&metrics))` and keep the
/// `Arc` to read the counters or render them as exposition text.
///
/// All counters are plain atomics updated with `Ordering::Relaxed`; values
/// are eventually consistent.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    error_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    stack_size: AtomicUsize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of requests seen.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests whose chain returned an error.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Mean time spent in the wrapped chain; zero before the first request.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Stack size of the coroutine that served the most recent request, or
    /// the runtime default when it ran outside a coroutine.
    pub fn stack_size(&self) -> usize {
        self.stack_size.load(Ordering::Relaxed)
    }

    /// Render the counters in the Prometheus text exposition format.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        format!(
            "# HELP switchyard_requests_total Total number of requests handled\n\
             # TYPE switchyard_requests_total counter\n\
             switchyard_requests_total {}\n\
             # HELP switchyard_request_errors_total Requests whose handler returned an error\n\
             # TYPE switchyard_request_errors_total counter\n\
             switchyard_request_errors_total {}\n\
             # HELP switchyard_request_latency_seconds Average request latency\n\
             # TYPE switchyard_request_latency_seconds gauge\n\
             switchyard_request_latency_seconds {:.6}\n\
             # HELP switchyard_coroutine_stack_bytes Coroutine stack size\n\
             # TYPE switchyard_coroutine_stack_bytes gauge\n\
             switchyard_coroutine_stack_bytes {}\n\
             # HELP switchyard_uncached_header_lines_total Response header lines leaked without interning\n\
             # TYPE switchyard_uncached_header_lines_total counter\n\
             switchyard_uncached_header_lines_total {}\n",
            self.request_count(),
            self.error_count(),
            self.average_latency().as_secs_f64(),
            self.stack_size(),
            uncached_header_lines(),
        )
    }
}

impl Hooks for MetricsMiddleware {
    fn before(&self, _ctx: &mut Context) -> HandlerResult {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn after(&self, _ctx: &mut Context, result: &HandlerResult, latency: Duration) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        if result.is_err() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let size = if may::coroutine::is_coroutine() {
            may::coroutine::current().stack_size()
        } else {
            may::config().get_stack_size()
        };
        self.stack_size.store(size, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::HttpError;
    use crate::middleware::{Handler, Middleware};

    #[test]
    fn test_counts_requests_and_errors() {
        let metrics = Arc::new(MetricsMiddleware::new());
        let mw = Middleware::from_hooks(Arc::clone(&metrics));
        let ok = mw.apply(Handler::new(|_| Ok(())));
        let failing = mw.apply(Handler::new(|_| Err(HttpError::not_found().into())));

        let mut ctx = Context::detached();
        ok.call(&mut ctx).unwrap();
        ok.call(&mut ctx).unwrap();
        assert!(failing.call(&mut ctx).is_err());

        assert_eq!(metrics.request_count(), 3);
        assert_eq!(metrics.error_count(), 1);
    }

    #[test]
    fn test_average_latency_zero_without_requests() {
        assert_eq!(MetricsMiddleware::new().average_latency(), Duration::ZERO);
    }

    #[test]
    fn test_prometheus_text() {
        let metrics = MetricsMiddleware::new();
        let mut ctx = Context::detached();
        metrics.before(&mut ctx).unwrap();
        metrics.after(&mut ctx, &Ok(()), Duration::from_millis(2));
        let text = metrics.render_prometheus();
        assert!(text.contains("switchyard_requests_total 1"));
        assert!(text.contains("switchyard_request_errors_total 0"));
        assert!(text.contains("# TYPE switchyard_request_latency_seconds gauge"));
        assert!(text.contains("switchyard_uncached_header_lines_total "));
    }
}
