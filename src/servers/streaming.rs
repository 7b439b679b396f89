//! Streaming surface.
//!
//! Every request is forwarded to the upstream target. When the inbound
//! request carries the trigger header, the response body is run through a
//! [`FilterBody`] that replaces the internal address with the header value
//! as bytes arrive. Without the header the response streams back untouched.

use super::{accept_loop, text_response};
use crate::codec::TextCodec;
use crate::content_type::ContentTypeGateType;
use crate::filter::body::BoxError;
use crate::filter::{FilterBody, RewriteHookSet};
use crate::metrics::{Metrics, Timer};
use crate::rewrite::{AddressRewriter, RewriterType};
use crate::server::ServerResources;
use crate::upstream::{HttpClient, build_forward_request, forward, upstream_uri};
use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderName};
use hyper::{HeaderMap, Request, Response, StatusCode};
use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

pub type StreamingBody = UnsyncBoxBody<Bytes, BoxError>;

pub struct StreamingServer {
    resources: ServerResources,
}

/// Per-server state shared by every connection
pub struct StreamingContext {
    pub target: String,
    pub timeout: Duration,
    pub trigger_header: HeaderName,
    pub client: HttpClient,
    pub rewriter: RewriterType,
    pub gate: ContentTypeGateType,
    pub metrics: Arc<Metrics>,
}

impl StreamingServer {
    pub fn new(resources: ServerResources) -> Self {
        Self { resources }
    }

    pub async fn start(&self) -> Result<()> {
        let server_config = &self.resources.config.servers.streaming;
        if !server_config.enabled {
            info!("Streaming server is disabled");
            return Ok(());
        }

        let bind_addr = format!("{}:{}", server_config.bind_address, server_config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind streaming server to {}", bind_addr))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let config = &self.resources.config;
        let trigger_header = HeaderName::from_bytes(config.rewrite.trigger_header.as_bytes())
            .with_context(|| {
                format!("Invalid trigger header: {}", config.rewrite.trigger_header)
            })?;

        info!(
            "Streaming server listening on {} (trigger header {}, target {})",
            listener.local_addr()?,
            trigger_header,
            config.upstream.target
        );

        let ctx = Arc::new(StreamingContext {
            target: config.upstream.target.clone(),
            timeout: config.upstream_timeout(),
            trigger_header,
            client: self.resources.client.clone(),
            rewriter: Arc::clone(&self.resources.rewriter),
            gate: Arc::clone(&self.resources.gate),
            metrics: Arc::clone(&self.resources.metrics),
        });

        accept_loop(listener, "Streaming", move |req| {
            let ctx = Arc::clone(&ctx);
            async move { Ok::<_, Infallible>(handle_streaming_request(req, &ctx).await) }
        })
        .await
    }
}

/// Public address requested by the caller, if any
pub fn requested_public_address(headers: &HeaderMap, trigger: &HeaderName) -> Option<String> {
    headers
        .get(trigger)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Hooks for one streamed response: a text transform replacing the internal
/// address and a capture that accounts the delivered bytes.
///
/// The text transform also runs per chunk; the capture runs once, right
/// after the whole-buffer pass, so it reads that pass's replacement count.
pub fn rewrite_hooks(ctx: &StreamingContext, public_address: String) -> RewriteHookSet {
    let rewriter = ctx.rewriter.with_public_address(public_address);
    let metrics = Arc::clone(&ctx.metrics);
    let last_replacements = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&last_replacements);

    RewriteHookSet::new()
        .on_transform_final_text(move |text| {
            let result = rewriter.rewrite(&text);
            counted.store(result.replacements, Ordering::Relaxed);
            match result.text {
                Cow::Owned(rewritten) => rewritten,
                Cow::Borrowed(_) => text,
            }
        })
        .on_capture_bytes(move |body| {
            let replacements = last_replacements.swap(0, Ordering::Relaxed);
            debug!(
                "Streamed response completed ({} bytes, {} replacements)",
                body.len(),
                replacements
            );
            metrics.record_bytes_sent(body.len() as u64);
            metrics.record_streamed_rewrite(replacements);
        })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response<StreamingBody> {
    text_response::<Full<Bytes>>(status, message)
        .map(|body| body.map_err(|never| match never {}).boxed_unsync())
}

pub async fn handle_streaming_request(
    req: Request<Incoming>,
    ctx: &StreamingContext,
) -> Response<StreamingBody> {
    let timer = Timer::start();
    let public_address = requested_public_address(req.headers(), &ctx.trigger_header);

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();

    let uri = match upstream_uri(&ctx.target, &path_and_query) {
        Ok(uri) => uri,
        Err(e) => {
            ctx.metrics.record_upstream_error();
            return error_response(e.status(), e.to_string());
        }
    };

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };
    let bytes_received = body.len() as u64;

    let result = match build_forward_request(&parts.method, uri, &parts.headers, body, &ctx.target)
    {
        Ok(forward_req) => forward(&ctx.client, forward_req, ctx.timeout).await,
        Err(e) => Err(e),
    };

    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            ctx.metrics.record_upstream_error();
            ctx.metrics
                .record_request(false, bytes_received, 0, timer.elapsed());
            return error_response(e.status(), format!("Upstream error: {}", e));
        }
    };
    ctx.metrics
        .record_request(true, bytes_received, 0, timer.elapsed());

    let (mut resp_parts, resp_body) = resp.into_parts();
    let content_type = resp_parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let eligible = content_type
        .as_deref()
        .is_some_and(|ct| ctx.gate.is_rewritable(ct));

    let body = match public_address {
        Some(public_address) if eligible => {
            debug!(
                "Attaching rewrite filter: {} -> {} ({} {})",
                ctx.rewriter.internal_address(),
                public_address,
                parts.method,
                path_and_query
            );
            ctx.metrics.record_filter_attached();
            resp_parts.headers.remove(CONTENT_LENGTH);

            let codec = TextCodec::from_content_type(content_type.as_deref());
            FilterBody::new(resp_body, rewrite_hooks(ctx, public_address), codec).boxed_unsync()
        }
        _ => resp_body.map_err(BoxError::from).boxed_unsync(),
    };

    Response::from_parts(resp_parts, body)
}
