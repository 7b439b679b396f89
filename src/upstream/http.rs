use crate::error::UpstreamError;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{ACCEPT, CONTENT_LENGTH, HOST, HeaderValue};
use hyper::{HeaderMap, Method, Request, Response, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Headers the hosting platform manages itself; never forwarded
pub const RESERVED_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "date",
    "expect",
    "host",
    "if-modified-since",
    "range",
    "transfer-encoding",
    "proxy-connection",
];

/// Headers handled separately: `accept` is re-added, the others are dropped
pub const SPECIAL_HEADERS: &[&str] = &["accept", "accept-encoding", "user-agent"];

/// Shared HTTP client for upstream requests
pub type HttpClient = Client<HttpConnector, Full<Bytes>>;

/// Create a new HTTP client instance
pub fn create_http_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build_http()
}

/// `http://{target}{path_and_query}`
pub fn upstream_uri(target: &str, path_and_query: &str) -> Result<Uri, UpstreamError> {
    let path_and_query = if path_and_query.starts_with('/') {
        path_and_query.to_string()
    } else {
        format!("/{}", path_and_query)
    };

    format!("http://{}{}", target, path_and_query)
        .parse()
        .map_err(|_| UpstreamError::InvalidAddress {
            address: target.to_string(),
        })
}

fn declared_content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Build the request sent to the backend from an inbound request's parts.
///
/// Reserved and special headers are filtered, `Accept` is carried over
/// explicitly and `Host` names the target. The body is attached only for
/// methods other than GET and HEAD that declare a positive length.
pub fn build_forward_request(
    method: &Method,
    uri: Uri,
    headers: &HeaderMap,
    body: Bytes,
    target: &str,
) -> Result<Request<Full<Bytes>>, UpstreamError> {
    let has_body = *method != Method::GET
        && *method != Method::HEAD
        && declared_content_length(headers) > 0;
    let body = if has_body { body } else { Bytes::new() };

    let mut req = Request::builder()
        .method(method.clone())
        .uri(uri)
        .body(Full::new(body))
        .map_err(|e| UpstreamError::InvalidAddress {
            address: format!("{} ({})", target, e),
        })?;

    let out = req.headers_mut();
    for (key, value) in headers {
        let key_str = key.as_str();
        if RESERVED_HEADERS.contains(&key_str) || SPECIAL_HEADERS.contains(&key_str) {
            continue;
        }
        out.append(key, value.clone());
    }
    for accept in headers.get_all(ACCEPT) {
        out.append(ACCEPT, accept.clone());
    }

    out.insert(
        HOST,
        HeaderValue::from_str(target).map_err(|_| UpstreamError::InvalidAddress {
            address: target.to_string(),
        })?,
    );

    Ok(req)
}

/// Send a request upstream with timeout control
pub async fn forward(
    client: &HttpClient,
    req: Request<Full<Bytes>>,
    timeout: Duration,
) -> Result<Response<Incoming>, UpstreamError> {
    let method = req.method().clone();
    let upstream = req.uri().to_string();

    debug!("Sending {} request to upstream: {}", method, upstream);

    match tokio::time::timeout(timeout, client.request(req)).await {
        Ok(Ok(resp)) => {
            let status = resp.status();
            debug!("Received response from upstream: {} {}", status, upstream);
            if !status.is_success() {
                warn!(
                    "Upstream returned non-success status: {} {}",
                    status, upstream
                );
            }
            Ok(resp)
        }
        Ok(Err(e)) => {
            error!(
                "HTTP upstream request failed: {} {} -> {}",
                method, upstream, e
            );
            Err(UpstreamError::Unreachable {
                upstream,
                reason: e.to_string(),
            })
        }
        Err(_) => {
            error!(
                "HTTP upstream request timeout: {} {} (timeout: {:?})",
                method, upstream, timeout
            );
            Err(UpstreamError::Timeout { upstream, timeout })
        }
    }
}

/// Buffer an upstream response body
pub async fn collect_response(
    resp: Response<Incoming>,
    upstream: &str,
) -> Result<Response<Bytes>, UpstreamError> {
    let (parts, body) = resp.into_parts();
    let body_bytes = body
        .collect()
        .await
        .map_err(|e| UpstreamError::Unreachable {
            upstream: upstream.to_string(),
            reason: format!("failed to read response body: {}", e),
        })?
        .to_bytes();

    debug!("Response body size: {} bytes", body_bytes.len());
    Ok(Response::from_parts(parts, body_bytes))
}
