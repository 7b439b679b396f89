use crate::config::RewriteConfig;
use crate::rewriters::LiteralRewriter;
use std::borrow::Cow;
use std::sync::Arc;

/// Replaces the internal address in a piece of text
pub trait AddressRewriter {
    fn rewrite<'a>(&self, text: &'a str) -> RewriteResult<'a>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult<'a> {
    pub text: Cow<'a, str>,
    pub replacements: usize,
}

impl RewriteResult<'_> {
    pub fn is_unchanged(&self) -> bool {
        self.replacements == 0
    }
}

/// Type alias for the address rewriter used throughout the application
pub type RewriterType = Arc<LiteralRewriter>;

/// Create a new address rewriter instance from the given configuration
///
/// # Arguments
///
/// * `config` - The rewrite configuration containing the internal and public addresses
///
/// # Returns
///
/// Returns an `Arc`-wrapped `LiteralRewriter` that can be shared across tasks
pub fn create_rewriter(config: &RewriteConfig) -> RewriterType {
    Arc::new(LiteralRewriter::new(
        config.internal_address.clone(),
        config.public_address.clone(),
    ))
}
