//! End-to-end tests through a real `may_minihttp` listener.

use std::sync::Arc;

use switchyard::middleware::remove_trailing_slash;
use switchyard::server::{AppService, HttpServer, ServerHandle};
use switchyard::{App, Handler, HttpError};

mod common;
use common::http::{free_addr, header, parse_response, send_request};
use common::test_server::setup_may_runtime;

/// Server fixture; stops the listener when dropped.
struct TestServer {
    handle: Option<ServerHandle>,
    addr: std::net::SocketAddr,
}

impl TestServer {
    fn new() -> Self {
        setup_may_runtime();

        let mut app = App::new();
        app.pre([remove_trailing_slash()]);
        app.get(
            "/users/:id",
            Handler::new(|ctx| {
                let id = ctx.param("id").unwrap_or_default().to_string();
                let lang = ctx.lang().to_string();
                ctx.json(200, &serde_json::json!({ "id": id, "lang": lang }))
            }),
            &[],
        );
        app.post("/users", Handler::new(|ctx| ctx.no_content(201)), &[]);
        app.get(
            "/secret",
            Handler::new(|_| Err(HttpError::unauthorized().with_message("token required").into())),
            &[],
        );
        app.get("/boom", Handler::new(|_| Err(anyhow::anyhow!("disk on fire"))), &[]);

        let service = AppService::new(Arc::new(app.build()));
        let addr = free_addr();
        let handle = HttpServer(service).start(addr).unwrap();
        handle.wait_ready().unwrap();
        Self {
            handle: Some(handle),
            addr,
        }
    }

    fn get(&self, path: &str, extra: &str) -> (u16, Vec<(String, String)>, String) {
        let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n{extra}\r\n");
        parse_response(&send_request(&self.addr, &req))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn test_server_routes_and_params() {
    let server = TestServer::new();
    let (status, headers, body) = server.get("/users/42", "Accept-Language: fr;q=0.5, de\r\n");
    assert_eq!(status, 200);
    assert!(header(&headers, "Content-Type").unwrap().starts_with("application/json"));
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["id"], "42");
    assert_eq!(value["lang"], "de");
}

#[test]
fn test_server_trailing_slash_forward() {
    let server = TestServer::new();
    let (status, _, body) = server.get("/users/7/", "");
    assert_eq!(status, 200);
    assert!(body.contains("\"7\""));
}

#[test]
fn test_server_not_found_and_method_not_allowed() {
    let server = TestServer::new();
    let (status, _, body) = server.get("/nope", "");
    assert_eq!(status, 404);
    assert_eq!(body, "Not Found");

    let (status, headers, _) = server.get("/users", "");
    assert_eq!(status, 405);
    assert_eq!(header(&headers, "Allow"), Some("POST"));
}

#[test]
fn test_server_error_mapping() {
    let server = TestServer::new();
    let (status, _, body) = server.get("/secret", "");
    assert_eq!(status, 401);
    assert_eq!(body, "token required");

    let (status, _, body) = server.get("/boom", "");
    assert_eq!(status, 500);
    assert_eq!(body, "Internal Server Error");
}

#[test]
fn test_server_head_has_no_body() {
    let server = TestServer::new();
    let req = "HEAD /nope HTTP/1.1\r\nHost: localhost\r\n\r\n";
    let (status, _, body) = parse_response(&send_request(&server.addr, req));
    assert_eq!(status, 404);
    assert!(body.is_empty());
}
