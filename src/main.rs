use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json;
use switchyard::logging::{init_logging, LogConfig};
use switchyard::middleware::{remove_trailing_slash, request_logger, MetricsMiddleware};
use switchyard::runtime_config::RuntimeConfig;
use switchyard::server::{AppService, HttpServer};
use switchyard::{mime, App, Handler, Middleware};
use tracing::info;

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Switchyard demo server", long_about = None)]
struct Cli {
    /// Listen address
    #[arg(long, env = "SWITCHYARD_ADDR")]
    addr: Option<String>,

    /// Show internal error messages in 500 responses
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[derive(Debug, Deserialize, Serialize)]
struct Greeting {
    name: String,
    #[serde(default)]
    lang: Option<String>,
}

fn build_app(debug: bool, metrics: &Arc<MetricsMiddleware>) -> App {
    let mut app = App::new();
    app.set_debug(debug);
    app.pre([remove_trailing_slash()]);
    app.use_middleware([request_logger(), Middleware::from_hooks(Arc::clone(metrics))]);

    app.get("/", Handler::new(|ctx| ctx.string(200, "switchyard")), &[]);
    app.get("/health", Handler::new(|ctx| ctx.json(200, &json!({ "status": "ok" }))), &[]);

    let hello = Handler::new(|ctx| {
        let name = ctx.param("name").unwrap_or("world").to_string();
        let lang = ctx.lang().to_string();
        ctx.json(200, &Greeting {
            name,
            lang: (!lang.is_empty()).then_some(lang),
        })
    });
    app.get("/hello/:name", hello.clone(), &[]);

    let link = app.uri(hello.id(), &["switchyard"]);
    app.get(
        "/link",
        Handler::new(move |ctx| ctx.string(200, &link)),
        &[],
    );

    app.post(
        "/greetings",
        Handler::new(|ctx| {
            let greeting: Greeting = ctx.bind()?;
            ctx.json(201, &greeting)
        }),
        &[],
    );

    app.get(
        "/files/*",
        Handler::new(|ctx| {
            let path = ctx.param("*").unwrap_or_default().to_string();
            ctx.string(200, &path)
        }),
        &[],
    );

    let scrape = Arc::clone(metrics);
    app.get(
        "/metrics",
        Handler::new(move |ctx| {
            let body = scrape.render_prometheus();
            ctx.blob(200, "text/plain; version=0.0.4", body.as_bytes())
        }),
        &[],
    );

    app.get(
        "/raw",
        Handler::new(|ctx| ctx.blob(200, mime::APPLICATION_OCTET_STREAM, &[0xde, 0xad, 0xbe, 0xef])),
        &[],
    );

    app
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;

    let mut config = RuntimeConfig::from_env();
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }
    config.debug |= cli.debug;
    config.apply();

    let metrics = Arc::new(MetricsMiddleware::new());
    let app = build_app(config.debug, &metrics);
    for route in app.routes() {
        info!(method = %route.method, path = %route.path, handler = %route.handler, "Route");
    }

    let dispatcher = Arc::new(app.build());
    let handle = HttpServer(AppService::new(dispatcher))
        .start(config.addr.as_str())
        .with_context(|| format!("failed to bind {}", config.addr))?;
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server coroutine panicked"))?;
    Ok(())
}
