use crate::rewrite::{AddressRewriter, RewriteResult};
use std::borrow::Cow;
use tracing::debug;

/// Literal substring replacement of the internal address by the public one
#[derive(Debug, Clone)]
pub struct LiteralRewriter {
    internal: String,
    public: String,
}

impl LiteralRewriter {
    pub fn new(internal: impl Into<String>, public: impl Into<String>) -> Self {
        Self {
            internal: internal.into(),
            public: public.into(),
        }
    }

    pub fn internal_address(&self) -> &str {
        &self.internal
    }

    pub fn public_address(&self) -> &str {
        &self.public
    }

    /// Same internal address, different public address. Used when the public
    /// address arrives per request.
    pub fn with_public_address(&self, public: impl Into<String>) -> Self {
        Self::new(self.internal.clone(), public)
    }

    /// Owned variant of [`AddressRewriter::rewrite`] for text transform hooks.
    pub fn rewrite_owned(&self, text: String) -> String {
        if self.internal.is_empty() || !text.contains(self.internal.as_str()) {
            return text;
        }
        text.replace(self.internal.as_str(), &self.public)
    }

    pub fn count_occurrences(&self, text: &str) -> usize {
        if self.internal.is_empty() {
            return 0;
        }
        text.matches(self.internal.as_str()).count()
    }
}

impl AddressRewriter for LiteralRewriter {
    fn rewrite<'a>(&self, text: &'a str) -> RewriteResult<'a> {
        let replacements = self.count_occurrences(text);
        if replacements == 0 {
            return RewriteResult {
                text: Cow::Borrowed(text),
                replacements,
            };
        }

        debug!(
            "Address rewrite: {} -> {} ({} occurrences)",
            self.internal, self.public, replacements
        );

        RewriteResult {
            text: Cow::Owned(text.replace(self.internal.as_str(), &self.public)),
            replacements,
        }
    }
}

impl AddressRewriter for std::sync::Arc<LiteralRewriter> {
    fn rewrite<'a>(&self, text: &'a str) -> RewriteResult<'a> {
        self.as_ref().rewrite(text)
    }
}
