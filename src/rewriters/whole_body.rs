//! Whole-body rewriting: the buffered mode.
//!
//! The complete upstream body is decoded with its declared charset, every
//! occurrence of the internal address is replaced, and the result is
//! re-encoded. Bodies that are not eligible or not decodable are returned
//! byte-for-byte.

use crate::codec::TextCodec;
use crate::content_type::{ContentTypeGateType, PrefixGate};
use crate::rewrite::{AddressRewriter, RewriterType};
use bytes::Bytes;
use hyper::Response;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue, TRANSFER_ENCODING};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingContentType,
    UnsupportedContentType,
    NoOccurrences,
    DecodeFailed,
    EncodeFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyRewrite {
    Rewritten { body: Bytes, replacements: usize },
    Unchanged { body: Bytes, reason: SkipReason },
}

impl BodyRewrite {
    pub fn body(&self) -> &Bytes {
        match self {
            BodyRewrite::Rewritten { body, .. } | BodyRewrite::Unchanged { body, .. } => body,
        }
    }

    pub fn into_body(self) -> Bytes {
        match self {
            BodyRewrite::Rewritten { body, .. } | BodyRewrite::Unchanged { body, .. } => body,
        }
    }

    pub fn replacements(&self) -> usize {
        match self {
            BodyRewrite::Rewritten { replacements, .. } => *replacements,
            BodyRewrite::Unchanged { .. } => 0,
        }
    }
}

pub struct WholeBodyRewriter {
    rewriter: RewriterType,
    gate: ContentTypeGateType,
}

impl WholeBodyRewriter {
    pub fn new(rewriter: RewriterType, gate: ContentTypeGateType) -> Self {
        Self { rewriter, gate }
    }

    /// Rewriter with the default `text/*` and `application/json` gate
    pub fn with_default_gate(rewriter: RewriterType) -> Self {
        Self::new(rewriter, Arc::new(PrefixGate::default()))
    }

    pub fn rewrite(&self, body: Bytes, content_type: Option<&str>) -> BodyRewrite {
        let Some(content_type) = content_type else {
            return BodyRewrite::Unchanged {
                body,
                reason: SkipReason::MissingContentType,
            };
        };

        if !self.gate.is_rewritable(content_type) {
            debug!("Skipping rewrite for content type: {}", content_type);
            return BodyRewrite::Unchanged {
                body,
                reason: SkipReason::UnsupportedContentType,
            };
        }

        let codec = TextCodec::from_content_type(Some(content_type));
        match self.rewrite_text(&codec, &body) {
            Ok((bytes, replacements)) => BodyRewrite::Rewritten {
                body: Bytes::from(bytes),
                replacements,
            },
            Err(reason) => BodyRewrite::Unchanged { body, reason },
        }
    }

    fn rewrite_text(&self, codec: &TextCodec, body: &[u8]) -> Result<(Vec<u8>, usize), SkipReason> {
        let text = codec.decode(body).map_err(|e| {
            warn!("Body left unrewritten: {}", e);
            SkipReason::DecodeFailed
        })?;

        let result = self.rewriter.rewrite(&text);
        if result.is_unchanged() {
            return Err(SkipReason::NoOccurrences);
        }

        let encoded = codec.encode(&result.text).map_err(|e| {
            warn!("Body left unrewritten: {}", e);
            SkipReason::EncodeFailed
        })?;

        Ok((encoded.into_owned(), result.replacements))
    }

    /// Rewrite a buffered response in place of its body, adjusting the
    /// declared length. Status and other headers are kept.
    pub fn rewrite_response(&self, response: Response<Bytes>) -> (Response<Bytes>, BodyRewrite) {
        let (mut parts, body) = response.into_parts();
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let outcome = self.rewrite(body, content_type.as_deref());
        let body = outcome.body().clone();

        parts.headers.remove(TRANSFER_ENCODING);
        parts
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        (Response::from_parts(parts, body), outcome)
    }
}
