//! Text codec used by every decode/re-encode step.
//!
//! Wraps an `encoding_rs` encoding. Decoding is strict: malformed input is
//! reported rather than patched with replacement characters, so callers can
//! skip a transform instead of delivering corrupted text.

use crate::content_type;
use crate::error::TransformError;
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCodec {
    encoding: &'static Encoding,
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::utf8()
    }
}

impl TextCodec {
    pub fn utf8() -> Self {
        Self { encoding: UTF_8 }
    }

    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// Look up a codec by WHATWG label, e.g. `utf-8` or `latin1`.
    pub fn for_label(label: &str) -> Option<Self> {
        Encoding::for_label(label.trim().as_bytes()).map(Self::new)
    }

    /// Codec for the charset declared in a `Content-Type` value.
    /// Falls back to UTF-8 when the charset is missing or unknown.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        content_type
            .and_then(content_type::charset)
            .and_then(Self::for_label)
            .unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, TransformError> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .ok_or(TransformError::Decode {
                encoding: self.name(),
                len: bytes.len(),
            })
    }

    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, TransformError> {
        let (bytes, output_encoding, had_unmappable) = self.encoding.encode(text);
        // encoding_rs emits UTF-8 for UTF-16 and replacement encodings
        if had_unmappable || output_encoding != self.encoding {
            return Err(TransformError::Encode {
                encoding: self.name(),
            });
        }
        Ok(bytes)
    }

    /// Decode, apply `f`, re-encode. Any codec failure is returned so the
    /// caller can keep the original bytes.
    pub fn transform<F>(&self, bytes: &[u8], f: F) -> Result<Vec<u8>, TransformError>
    where
        F: FnOnce(String) -> String,
    {
        let text = self.decode(bytes)?.into_owned();
        let output = f(text);
        Ok(self.encode(&output)?.into_owned())
    }
}
