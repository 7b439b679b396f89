use bytes::Bytes;
use futures::stream;
use http_body::{Body, Frame};
use http_body_util::{BodyExt, StreamBody};
use hyper::HeaderMap;
use response_rewrite_proxy::codec::TextCodec;
use response_rewrite_proxy::filter::{FilterBody, RewriteHookSet};
use response_rewrite_proxy::rewriters::LiteralRewriter;
use std::convert::Infallible;
use std::io;

fn frames(chunks: &[&'static [u8]]) -> Vec<Result<Frame<Bytes>, Infallible>> {
    chunks
        .iter()
        .map(|c| Ok(Frame::data(Bytes::from_static(*c))))
        .collect()
}

fn streaming_hooks() -> RewriteHookSet {
    let rewriter = LiteralRewriter::new("internal-host", "public.example.com");
    RewriteHookSet::new()
        .on_transform_final_bytes(|bytes| bytes)
        .on_transform_final_text(move |text| rewriter.rewrite_owned(text))
}

#[tokio::test]
async fn test_pass_through_body_streams_each_chunk() {
    let inner = StreamBody::new(stream::iter(frames(&[
        b"<a href=//internal-host/a>",
        b"<a href=//internal-host/b>",
    ])));
    let mut body = FilterBody::new(inner, streaming_hooks(), TextCodec::utf8());

    let mut chunks = Vec::new();
    while let Some(frame) = body.frame().await {
        chunks.push(frame.unwrap().into_data().unwrap());
    }

    assert_eq!(
        chunks,
        vec![
            Bytes::from_static(b"<a href=//public.example.com/a>"),
            Bytes::from_static(b"<a href=//public.example.com/b>"),
        ]
    );
    assert!(body.is_end_stream());
}

#[tokio::test]
async fn test_delayed_body_emits_once() {
    let inner = StreamBody::new(stream::iter(frames(&[b"one ", b"two ", b"three"])));
    let mut body = FilterBody::new(inner, RewriteHookSet::new(), TextCodec::utf8());

    let first = body.frame().await.unwrap().unwrap();
    assert_eq!(first.into_data().unwrap(), Bytes::from_static(b"one two three"));
    assert!(body.frame().await.is_none());
    assert_eq!(body.filter().cached_len(), 0);
}

#[tokio::test]
async fn test_delayed_body_applies_final_text() {
    let rewriter = LiteralRewriter::new("internal-host", "public.example.com");
    let hooks = RewriteHookSet::new().on_transform_final_text(move |text| rewriter.rewrite_owned(text));

    // occurrence split across frames
    let inner = StreamBody::new(stream::iter(frames(&[b"see internal-", b"host/docs"])));
    let collected = FilterBody::new(inner, hooks, TextCodec::utf8())
        .collect()
        .await
        .unwrap()
        .to_bytes();

    assert_eq!(collected, Bytes::from_static(b"see public.example.com/docs"));
}

#[tokio::test]
async fn test_empty_body() {
    let inner = StreamBody::new(stream::iter(frames(&[])));
    let collected = FilterBody::new(inner, streaming_hooks(), TextCodec::utf8())
        .collect()
        .await
        .unwrap()
        .to_bytes();

    assert!(collected.is_empty());
}

#[tokio::test]
async fn test_trailers_follow_withheld_output() {
    let mut trailers = HeaderMap::new();
    trailers.insert("x-checksum", "abc".parse().unwrap());

    let inner = StreamBody::new(stream::iter(vec![
        Ok::<_, Infallible>(Frame::data(Bytes::from_static(b"payload"))),
        Ok(Frame::trailers(trailers)),
    ]));
    let collected = FilterBody::new(inner, RewriteHookSet::new(), TextCodec::utf8())
        .collect()
        .await
        .unwrap();

    assert_eq!(collected.trailers().unwrap()["x-checksum"], "abc");
    assert_eq!(collected.to_bytes(), Bytes::from_static(b"payload"));
}

#[tokio::test]
async fn test_upstream_error_is_propagated() {
    let inner = StreamBody::new(stream::iter(vec![
        Ok(Frame::data(Bytes::from_static(b"partial"))),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
    ]));
    let result = FilterBody::new(inner, RewriteHookSet::new(), TextCodec::utf8())
        .collect()
        .await;

    let err = result.err().expect("body error");
    assert_eq!(err.to_string(), "reset");
}
