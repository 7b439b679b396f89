pub mod app;
pub mod codec;
pub mod config;
pub mod content_type;
pub mod error;
pub mod filter;
pub mod logging;
pub mod metrics;
pub mod rewrite;
pub mod rewriters;
pub mod server;
pub mod servers;
pub mod upstream;

// Re-export commonly used types for convenience
pub use codec::TextCodec;
pub use config::{AppConfig, RewriteConfig, ServersConfig, UpstreamConfig};
pub use filter::{FilterBody, ResponseRewriteFilter, RewriteHookSet};
pub use rewrite::RewriterType;
pub use rewriters::{LiteralRewriter, WholeBodyRewriter};
