use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::http::header::HeaderValue;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::routes::health_check;
use crate::routes::preflight;
use crate::routes::signup;
use crate::routes::SIGNUP_BODY_LIMIT;
use crate::webhook_client::WebhookClient;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the configured address (port 0 picks a random one) and build the
    /// server. A missing webhook url is logged here, but is not fatal.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(&addr).with_context(|| format!("could not bind {addr}"))?;
        let port = listener.local_addr()?.port();

        let webhook_client = cfg.webhook.client();
        if !webhook_client.is_configured() {
            tracing::warn!("No webhook url configured; signups will be accepted but not relayed");
        }

        let allowed_origin = HeaderValue::from_str(&cfg.application.allowed_origin)
            .context("allowed_origin is not a valid header value")?;

        let server = run(
            listener,
            webhook_client,
            AllowedOrigin(allowed_origin),
            SourceLabel(cfg.application.source_label),
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The only origin browsers may submit signups from
#[derive(Clone)]
pub struct AllowedOrigin(pub HeaderValue);

/// Label shown as the notification's `Source:` (because raw `String`s may
/// conflict with one another when passed around by `Data`)
pub struct SourceLabel(pub String);

/// Headers that every response from `/api/signup` carries, errors included.
fn cors_headers(origin: &AllowedOrigin) -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.0.clone()))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .add((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    webhook_client: WebhookClient,
    allowed_origin: AllowedOrigin,
    source_label: SourceLabel,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`; every worker's `App` shares the same client (and
    // thus its connection pool)
    let webhook_client = Data::new(webhook_client);
    let source_label = Data::new(source_label);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/api/signup")
                    .wrap(cors_headers(&allowed_origin))
                    .app_data(web::PayloadConfig::new(SIGNUP_BODY_LIMIT))
                    .route(web::post().to(signup))
                    .route(web::method(actix_web::http::Method::OPTIONS).to(preflight)),
            )
            .app_data(webhook_client.clone())
            .app_data(source_label.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
