/// Content-type gating: decides which bodies are eligible for rewriting
use std::sync::Arc;

/// Default media type prefixes eligible for rewriting
pub const DEFAULT_REWRITABLE_PREFIXES: &[&str] = &["text/", "application/json"];

/// Predicate over a `Content-Type` value deciding rewrite eligibility
pub trait ContentTypeGate: Send + Sync {
    fn is_rewritable(&self, content_type: &str) -> bool;
}

/// Type alias for the gate shared across servers
pub type ContentTypeGateType = Arc<dyn ContentTypeGate>;

/// Case-insensitive prefix match on the media type
#[derive(Debug, Clone)]
pub struct PrefixGate {
    prefixes: Vec<String>,
}

impl PrefixGate {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.into().to_ascii_lowercase())
                .collect(),
        }
    }
}

impl Default for PrefixGate {
    fn default() -> Self {
        Self::new(DEFAULT_REWRITABLE_PREFIXES.iter().copied())
    }
}

impl ContentTypeGate for PrefixGate {
    fn is_rewritable(&self, content_type: &str) -> bool {
        let media = media_type(content_type).to_ascii_lowercase();
        !media.is_empty() && self.prefixes.iter().any(|p| media.starts_with(p.as_str()))
    }
}

/// Media type portion of a `Content-Type` value, e.g. `text/html`
pub fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}

/// `charset` parameter of a `Content-Type` value, without quotes
pub fn charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}
