use std::io;
use std::sync::Arc;

use http::Method;
use may_minihttp::{HttpService, Request as WireRequest, Response as WireResponse};
use tracing::warn;

use super::request::parse_request;
use super::response::{write_response, Response};
use crate::dispatcher::Dispatcher;

/// `may_minihttp` service that hands every request to a [`Dispatcher`].
///
/// Cloning is cheap; the server clones the service once per connection.
#[derive(Clone)]
pub struct AppService {
    dispatcher: Arc<Dispatcher>,
}

impl AppService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: WireRequest, res: &mut WireResponse) -> io::Result<()> {
        let request = match parse_request(req) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Rejecting request with invalid method");
                let mut response = Response::new();
                response.set_header("Content-Type", crate::mime::TEXT_PLAIN_UTF8);
                response.write_header(400);
                response.write(b"Bad Request");
                write_response(res, response, false);
                return Ok(());
            }
        };

        // HEAD bodies are dropped on write; Content-Length then reads 0, a
        // limit of the crates.io may_minihttp response API.
        let head = request.method() == Method::HEAD;
        let response = self.dispatcher.serve(request);
        write_response(res, response, head);
        Ok(())
    }
}
