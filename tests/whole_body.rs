use bytes::Bytes;
use hyper::Response;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use response_rewrite_proxy::content_type::PrefixGate;
use response_rewrite_proxy::rewriters::{
    BodyRewrite, LiteralRewriter, SkipReason, WholeBodyRewriter,
};
use std::sync::Arc;

fn rewriter() -> WholeBodyRewriter {
    WholeBodyRewriter::with_default_gate(Arc::new(LiteralRewriter::new(
        "internal-host",
        "public.example.com",
    )))
}

#[test]
fn test_rewrites_html_body() {
    let body = Bytes::from_static(b"Welcome to internal-host/api, see internal-host/docs");
    let outcome = rewriter().rewrite(body, Some("text/html"));

    assert_eq!(outcome.replacements(), 2);
    assert_eq!(
        outcome.body().as_ref(),
        b"Welcome to public.example.com/api, see public.example.com/docs"
    );
}

#[test]
fn test_binary_body_is_untouched() {
    let body = Bytes::from_static(b"\x89PNG internal-host \xff\xfe");
    let outcome = rewriter().rewrite(body.clone(), Some("image/png"));

    assert!(matches!(
        outcome,
        BodyRewrite::Unchanged {
            reason: SkipReason::UnsupportedContentType,
            ..
        }
    ));
    assert_eq!(outcome.into_body(), body);
}

#[test]
fn test_missing_content_type_is_untouched() {
    let body = Bytes::from_static(b"internal-host");
    let outcome = rewriter().rewrite(body.clone(), None);

    assert!(matches!(
        outcome,
        BodyRewrite::Unchanged {
            reason: SkipReason::MissingContentType,
            ..
        }
    ));
    assert_eq!(outcome.body(), &body);
}

#[test]
fn test_body_without_occurrences() {
    let body = Bytes::from_static(b"{\"ok\":true}");
    let outcome = rewriter().rewrite(body.clone(), Some("application/json"));

    assert!(matches!(
        outcome,
        BodyRewrite::Unchanged {
            reason: SkipReason::NoOccurrences,
            ..
        }
    ));
    assert_eq!(outcome.replacements(), 0);
    assert_eq!(outcome.into_body(), body);
}

#[test]
fn test_rewrite_is_idempotent() {
    let rewriter = rewriter();
    let first = rewriter
        .rewrite(
            Bytes::from_static(b"http://internal-host/x"),
            Some("text/plain"),
        )
        .into_body();
    let second = rewriter.rewrite(first.clone(), Some("text/plain"));

    assert_eq!(second.replacements(), 0);
    assert_eq!(second.into_body(), first);
}

#[test]
fn test_invalid_text_is_untouched() {
    let body = Bytes::from_static(b"internal-host \xff\xfe");
    let outcome = rewriter().rewrite(body.clone(), Some("text/plain; charset=utf-8"));

    assert!(matches!(
        outcome,
        BodyRewrite::Unchanged {
            reason: SkipReason::DecodeFailed,
            ..
        }
    ));
    assert_eq!(outcome.into_body(), body);
}

#[test]
fn test_declared_charset_is_preserved() {
    // "café internal-host" in latin1
    let mut body = b"caf\xe9 ".to_vec();
    body.extend_from_slice(b"internal-host");
    let outcome = rewriter().rewrite(Bytes::from(body), Some("text/html; charset=ISO-8859-1"));

    assert_eq!(outcome.body().as_ref(), b"caf\xe9 public.example.com");
}

#[test]
fn test_custom_gate() {
    let rewriter = WholeBodyRewriter::new(
        Arc::new(LiteralRewriter::new("internal-host", "public.example.com")),
        Arc::new(PrefixGate::new(["application/xml"])),
    );

    let xml = rewriter.rewrite(
        Bytes::from_static(b"<a>internal-host</a>"),
        Some("application/xml"),
    );
    assert_eq!(xml.replacements(), 1);

    let html = rewriter.rewrite(Bytes::from_static(b"internal-host"), Some("text/html"));
    assert_eq!(html.replacements(), 0);
}

#[test]
fn test_rewrite_response_adjusts_length() {
    let response = Response::builder()
        .status(201)
        .header(CONTENT_TYPE, "text/html")
        .header(CONTENT_LENGTH, "24")
        .header(TRANSFER_ENCODING, "chunked")
        .header("x-custom", "kept")
        .body(Bytes::from_static(b"<a href=//internal-host>"))
        .unwrap();

    let (response, outcome) = rewriter().rewrite_response(response);
    let expected = b"<a href=//public.example.com>";

    assert_eq!(outcome.replacements(), 1);
    assert_eq!(response.status(), 201);
    assert_eq!(response.body().as_ref(), expected);
    assert_eq!(
        response.headers()[CONTENT_LENGTH],
        expected.len().to_string().as_str()
    );
    assert!(response.headers().get(TRANSFER_ENCODING).is_none());
    assert_eq!(response.headers()["x-custom"], "kept");
}

#[test]
fn test_rewrite_response_unchanged_body() {
    let response = Response::builder()
        .header(CONTENT_TYPE, "image/png")
        .body(Bytes::from_static(b"internal-host"))
        .unwrap();

    let (response, outcome) = rewriter().rewrite_response(response);

    assert_eq!(outcome.replacements(), 0);
    assert_eq!(response.body().as_ref(), b"internal-host");
    assert_eq!(response.headers()[CONTENT_LENGTH], "13");
}
