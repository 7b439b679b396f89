pub mod literal;
pub mod whole_body;

pub use literal::LiteralRewriter;
pub use whole_body::{BodyRewrite, SkipReason, WholeBodyRewriter};
