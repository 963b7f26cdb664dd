//! Middleware around dispatch.
//!
//! Middleware sees the buffered request before routing (common middleware)
//! or just before an authenticated handler (auth middleware), and the HTTP
//! response on the way back. It may short-circuit by not calling
//! [`Next::run`].
//!
//! Authentication middleware is where the caller identity gets attached:
//! it resolves the credential and calls [`hermes_core::AuthInfo::attach`]
//! on the request's extensions.
//!
//! # Example
//!
//! ```
//! use hermes_server::{BoxFuture, HttpResponse, Middleware, Next};
//! use hermes_core::Request;
//! use http::HeaderValue;
//!
//! struct ApiVersion;
//!
//! impl Middleware for ApiVersion {
//!     fn name(&self) -> &'static str {
//!         "api-version"
//!     }
//!
//!     fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, HttpResponse> {
//!         Box::pin(async move {
//!             let mut response = next.run(request).await;
//!             response
//!                 .headers_mut()
//!                 .insert("x-api-version", HeaderValue::from_static("3"));
//!             response
//!         })
//!     }
//! }
//! ```

use std::sync::Arc;

use hermes_core::{BoxFuture, Request};

use crate::response::HttpResponse;

/// A stage wrapped around dispatch.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Handles the request, normally by awaiting `next.run(request)`.
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, HttpResponse>;
}

type Endpoint<'a> = Box<dyn FnOnce(Request) -> BoxFuture<'a, HttpResponse> + Send + 'a>;

/// The rest of the chain.
///
/// Consumed by [`Next::run`], so it runs at most once.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    endpoint: Endpoint<'a>,
}

impl<'a> Next<'a> {
    /// A chain running `middleware` in order, then `endpoint`.
    pub(crate) fn new<F>(middleware: &'a [Arc<dyn Middleware>], endpoint: F) -> Self
    where
        F: FnOnce(Request) -> BoxFuture<'a, HttpResponse> + Send + 'a,
    {
        Self {
            remaining: middleware,
            endpoint: Box::new(endpoint),
        }
    }

    /// Runs the next middleware, or the endpoint once none remain.
    pub async fn run(self, request: Request) -> HttpResponse {
        match self.remaining.split_first() {
            Some((first, rest)) => {
                tracing::trace!(middleware = first.name(), "entering middleware");
                let next = Next {
                    remaining: rest,
                    endpoint: self.endpoint,
                };
                first.process(request, next).await
            }
            None => (self.endpoint)(request).await,
        }
    }
}
