use super::{accept_loop, text_response};
use crate::config::AppConfig;
use crate::metrics::Metrics;
use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct HealthcheckServer {
    config: Arc<AppConfig>,
    metrics: Arc<Metrics>,
}

impl HealthcheckServer {
    pub fn new(config: Arc<AppConfig>, metrics: Arc<Metrics>) -> Self {
        Self { config, metrics }
    }

    pub async fn start(&self) -> Result<()> {
        let server_config = &self.config.servers.healthcheck;
        if !server_config.enabled {
            info!("Healthcheck server is disabled");
            return Ok(());
        }

        let bind_addr = format!("{}:{}", server_config.bind_address, server_config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind healthcheck server to {}", bind_addr))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let healthcheck_path = self.config.servers.healthcheck.path.clone();
        info!(
            "Healthcheck server listening on {} at path {}",
            listener.local_addr()?,
            healthcheck_path
        );

        let metrics = Arc::clone(&self.metrics);
        accept_loop(listener, "Healthcheck", move |req| {
            let path = healthcheck_path.clone();
            let metrics = Arc::clone(&metrics);
            async move { Ok::<_, Infallible>(handle_healthcheck(req, &path, &metrics)) }
        })
        .await
    }
}

fn json_response(value: serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(value.to_string())));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn handle_healthcheck<B>(
    req: Request<B>,
    healthcheck_path: &str,
    metrics: &Metrics,
) -> Response<Full<Bytes>> {
    // Only handle GET requests
    if req.method() != Method::GET {
        return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let path = req.uri().path();

    if path == "/metrics" || path == "/stats" {
        return json_response(serde_json::json!(metrics.snapshot()));
    }

    if path != healthcheck_path {
        return text_response(StatusCode::NOT_FOUND, "Not found");
    }

    json_response(serde_json::json!({
        "status": "healthy",
        "service": "response-rewrite-proxy"
    }))
}
