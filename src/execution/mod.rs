//! Pipeline execution

pub mod engine;
pub mod request;

pub use request::{bearer_token, RequestContext, ResolverContext};
