pub mod forward;
pub mod healthcheck;
pub mod streaming;

pub use forward::ForwardServer;
pub use healthcheck::HealthcheckServer;
pub use streaming::StreamingServer;

use crate::filter::body::BoxError;
use anyhow::Result;
use bytes::Bytes;
use http_body::Body;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{debug, error};

/// Accept connections forever, serving each with HTTP/1 and `handler`
pub(crate) async fn accept_loop<F, Fut, B>(
    listener: TcpListener,
    name: &'static str,
    handler: F,
) -> Result<()>
where
    F: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<B>, Infallible>> + Send + 'static,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| handler(req));

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!("{} connection error from {}: {}", name, addr, e);
                    }
                });
            }
            Err(e) => {
                error!("{} accept error: {}", name, e);
            }
        }
    }
}

/// Plain-text response used for gateway and routing errors
pub(crate) fn text_response<B: From<Bytes>>(
    status: StatusCode,
    message: impl Into<String>,
) -> Response<B> {
    let mut response = Response::new(B::from(Bytes::from(message.into())));
    *response.status_mut() = status;
    response
}
