//! Request context for the resolver entry point

use http::header::AUTHORIZATION;
use http::{HeaderMap, Request};

/// Anything a resolver can read request headers from
pub trait RequestContext {
    fn header(&self, name: &str) -> Option<&str>;
}

impl RequestContext for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl<B> RequestContext for Request<B> {
    fn header(&self, name: &str) -> Option<&str> {
        RequestContext::header(self.headers(), name)
    }
}

/// Conventional resolver context holding the inbound request
#[derive(Debug)]
pub struct ResolverContext<B = ()> {
    pub request: Request<B>,
}

impl<B> ResolverContext<B> {
    pub fn new(request: Request<B>) -> Self {
        Self { request }
    }
}

impl<B> RequestContext for ResolverContext<B> {
    fn header(&self, name: &str) -> Option<&str> {
        RequestContext::header(&self.request, name)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// Returns `None` when the header is absent, uses another scheme or carries
/// an empty token.
pub fn bearer_token<C: RequestContext + ?Sized>(context: &C) -> Option<String> {
    context
        .header(AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(String::from)
}
