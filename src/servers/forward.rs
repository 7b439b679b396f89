//! Whole-body forwarding surface.
//!
//! `GET`/`POST {route_prefix}/{**path}` is forwarded to
//! `http://{target}/{path}?{query}`; the buffered response comes back with
//! its status and headers, the body rewritten and its length adjusted.

use super::{accept_loop, text_response};
use crate::metrics::{Metrics, Timer};
use crate::rewriters::WholeBodyRewriter;
use crate::server::ServerResources;
use crate::upstream::{
    HttpClient, build_forward_request, collect_response, forward, upstream_uri,
};
use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

pub struct ForwardServer {
    resources: ServerResources,
}

/// Per-server state shared by every connection
pub struct ForwardContext {
    pub route_prefix: String,
    pub target: String,
    pub timeout: Duration,
    pub client: HttpClient,
    pub rewriter: WholeBodyRewriter,
    pub metrics: Arc<Metrics>,
}

impl ForwardServer {
    pub fn new(resources: ServerResources) -> Self {
        Self { resources }
    }

    pub async fn start(&self) -> Result<()> {
        let server_config = &self.resources.config.servers.forward;
        if !server_config.enabled {
            info!("Forward server is disabled");
            return Ok(());
        }

        let bind_addr = format!("{}:{}", server_config.bind_address, server_config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind forward server to {}", bind_addr))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let config = &self.resources.config;
        info!(
            "Forward server listening on {} (route {}/*, target {})",
            listener.local_addr()?,
            config.servers.forward.route_prefix,
            config.upstream.target
        );

        let ctx = Arc::new(ForwardContext {
            route_prefix: config.servers.forward.route_prefix.clone(),
            target: config.upstream.target.clone(),
            timeout: config.upstream_timeout(),
            client: self.resources.client.clone(),
            rewriter: WholeBodyRewriter::new(
                Arc::clone(&self.resources.rewriter),
                Arc::clone(&self.resources.gate),
            ),
            metrics: Arc::clone(&self.resources.metrics),
        });

        accept_loop(listener, "Forward", move |req| {
            let ctx = Arc::clone(&ctx);
            async move { Ok::<_, Infallible>(handle_forward_request(req, &ctx).await) }
        })
        .await
    }
}

/// Remainder of `path` after `prefix`, or `None` when the route does not match.
/// Matching is ASCII case-insensitive on whole segments.
pub fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if path.len() < prefix.len() || !path.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = path.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    match rest {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

pub async fn handle_forward_request(
    req: Request<Incoming>,
    ctx: &ForwardContext,
) -> Response<Full<Bytes>> {
    let timer = Timer::start();

    if req.method() != Method::GET && req.method() != Method::POST {
        return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let Some(path) = strip_route_prefix(req.uri().path(), &ctx.route_prefix) else {
        return text_response(StatusCode::NOT_FOUND, "Not found");
    };
    let path_and_query = match req.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    debug!(
        "Forwarding {} {} -> {}{}",
        req.method(),
        req.uri(),
        ctx.target,
        path_and_query
    );

    let uri = match upstream_uri(&ctx.target, &path_and_query) {
        Ok(uri) => uri,
        Err(e) => {
            ctx.metrics.record_upstream_error();
            return text_response(e.status(), e.to_string());
        }
    };
    let upstream = uri.to_string();

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return text_response(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };
    let bytes_received = body.len() as u64;

    let result = async {
        let forward_req =
            build_forward_request(&parts.method, uri, &parts.headers, body, &ctx.target)?;
        let resp = forward(&ctx.client, forward_req, ctx.timeout).await?;
        collect_response(resp, &upstream).await
    }
    .await;

    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            ctx.metrics.record_upstream_error();
            ctx.metrics
                .record_request(false, bytes_received, 0, timer.elapsed());
            return text_response(e.status(), format!("Upstream error: {}", e));
        }
    };

    let (resp, outcome) = ctx.rewriter.rewrite_response(resp);
    ctx.metrics.record_rewrite(&outcome);
    debug!(
        "Rewrote {} occurrences in response from {}",
        outcome.replacements(),
        upstream
    );

    let bytes_sent = resp.body().len() as u64;
    ctx.metrics
        .record_request(true, bytes_received, bytes_sent, timer.elapsed());

    resp.map(Full::new)
}
