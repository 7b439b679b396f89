//! Streaming response rewrite filter.
//!
//! # Data Flow
//! ```text
//! producer write
//!     → cache (untransformed copy, when captured)
//!     → chunk transforms → downstream sink (unless output delayed)
//!
//! complete()
//!     → whole-buffer byte transform → whole-buffer text transform
//!     → captures (observation only)
//!     → downstream sink (when output delayed)
//!     → cache reset, downstream flush
//! ```

pub mod body;
pub mod hooks;
pub mod policy;
pub mod stream;

pub use body::FilterBody;
pub use hooks::RewriteHookSet;
pub use policy::{is_captured, is_output_delayed};
pub use stream::ResponseRewriteFilter;
