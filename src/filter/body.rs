//! `http_body::Body` adapter running a response body through a
//! [`ResponseRewriteFilter`] as frames arrive.

use super::hooks::RewriteHookSet;
use super::stream::ResponseRewriteFilter;
use crate::codec::TextCodec;
use bytes::Bytes;
use futures::ready;
use http_body::{Body, Frame};
use hyper::HeaderMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Wraps a response body. Each data frame is written to the filter; whatever
/// the filter releases to its in-memory sink is yielded as the next frame.
/// End of stream (or trailers) completes the filter exactly once.
pub struct FilterBody<B> {
    inner: B,
    filter: ResponseRewriteFilter<Vec<u8>>,
    trailers: Option<HeaderMap>,
    completed: bool,
}

impl<B> FilterBody<B> {
    pub fn new(inner: B, hooks: RewriteHookSet, codec: TextCodec) -> Self {
        Self {
            inner,
            filter: ResponseRewriteFilter::with_codec(Vec::new(), hooks, codec),
            trailers: None,
            completed: false,
        }
    }

    pub fn filter(&self) -> &ResponseRewriteFilter<Vec<u8>> {
        &self.filter
    }

    fn take_output(&mut self) -> Option<Frame<Bytes>> {
        let output = std::mem::take(self.filter.get_mut());
        (!output.is_empty()).then(|| Frame::data(Bytes::from(output)))
    }

    fn complete(&mut self) -> Result<Option<Frame<Bytes>>, BoxError> {
        self.completed = true;
        self.filter.complete()?;
        Ok(self.take_output())
    }
}

impl<B> Body for FilterBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        loop {
            if this.completed {
                return Poll::Ready(this.trailers.take().map(|t| Ok(Frame::trailers(t))));
            }

            match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
                Some(Ok(frame)) => match frame.into_data() {
                    Ok(data) => {
                        this.filter.write_chunk(&data)?;
                        if let Some(frame) = this.take_output() {
                            return Poll::Ready(Some(Ok(frame)));
                        }
                    }
                    Err(frame) => {
                        if let Ok(trailers) = frame.into_trailers() {
                            this.trailers = Some(trailers);
                        }
                        if let Some(frame) = this.complete()? {
                            return Poll::Ready(Some(Ok(frame)));
                        }
                    }
                },
                Some(Err(e)) => {
                    debug!("Upstream body error, dropping filtered response");
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => {
                    if let Some(frame) = this.complete()? {
                        return Poll::Ready(Some(Ok(frame)));
                    }
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.completed && self.trailers.is_none()
    }
}
