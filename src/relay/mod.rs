use actix_cors::Cors;
use actix_web::http::{header, StatusCode};
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use thiserror::Error;

/// Inference backend the relay forwards to unless overridden
pub const DEFAULT_BACKEND_URL: &str = "http://18.188.93.127:5000";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
/// Backend limit is 10 MiB of image; leave room for the multipart framing
pub const DEFAULT_BODY_LIMIT: usize = 12 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: String,
    pub backend_url: String,
    pub body_limit: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("backend response is not JSON: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("backend answered with unusable status {0}")]
    Status(u16),
}

/// Upstream half of the relay: one pooled client, one fixed endpoint
pub struct Relay {
    client: reqwest::Client,
    endpoint: String,
}

impl Relay {
    pub fn new(backend_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/analizar", backend_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send the body upstream untouched and hand back status and JSON
    pub async fn forward(&self, content_type: Option<&str>, body: web::Bytes) -> Result<(StatusCode, Value), RelayError> {
        tracing::debug!("Forwarding {} bytes to {}", body.len(), self.endpoint);

        let mut request = self.client.post(&self.endpoint).body(body);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }

        let response = request.send().await.map_err(RelayError::Transport)?;
        let upstream = response.status().as_u16();
        let status = StatusCode::from_u16(upstream).map_err(|_| RelayError::Status(upstream))?;
        let data = response.json::<Value>().await.map_err(RelayError::Decode)?;

        tracing::debug!("Backend answered {}", status);
        Ok((status, data))
    }
}

/// Register the relay's routes; expects `web::Data<Relay>` in app data
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health));

    // `/api/analizar` is where serverless deployments mount the handler
    for path in ["/analizar", "/api/analizar"] {
        cfg.service(
            web::resource(path)
                .route(web::post().to(analyze))
                .default_service(web::route().to(method_not_allowed)),
        );
    }
}

async fn health() -> impl Responder {
    web::Json(json!({ "status": "ok" }))
}

async fn method_not_allowed() -> impl Responder {
    HttpResponse::MethodNotAllowed().json(json!({ "error": "Method not allowed" }))
}

async fn analyze(relay: web::Data<Relay>, request: HttpRequest, body: web::Bytes) -> impl Responder {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    match relay.forward(content_type, body).await {
        Ok((status, data)) => HttpResponse::build(status).json(data),
        Err(err) => {
            tracing::error!("Proxy error: {}", err);
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to process request",
                "details": err.to_string(),
            }))
        }
    }
}

/// Run the relay until the server is stopped
pub async fn serve(config: RelayConfig) -> Result<()> {
    let relay = web::Data::new(Relay::new(&config.backend_url));
    let body_limit = config.body_limit;

    tracing::info!("Relay listening on {}", config.bind);
    tracing::info!("Forwarding to {}", relay.endpoint());

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(Cors::permissive())
            .app_data(relay.clone())
            .app_data(web::PayloadConfig::new(body_limit))
            .configure(routes)
    })
    .bind(&config.bind)
    .with_context(|| format!("Failed to bind relay to {}", config.bind))?
    .run()
    .await
    .context("Relay server failed")
}
