//! The handler contract and route declarations.
//!
//! A handler takes the [`RequestContext`] and the buffered request and
//! returns a [`HandlerResponse`] or an [`ApiError`]. Resource groups
//! expose their handlers as [`Route`]s through [`Routable`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::response::HandlerResponse;

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler produces.
pub type HandlerResult = Result<HandlerResponse, ApiError>;

/// A request with its body fully buffered.
pub type Request = http::Request<Bytes>;

/// A business handler.
///
/// Implemented for every `Fn(RequestContext, Request) -> Future` closure, so
/// plain `async fn`s can be registered directly.
///
/// # Example
///
/// ```
/// use hermes_core::{HandlerResponse, HandlerResult, Request, RequestContext};
///
/// async fn get_space(ctx: RequestContext, _req: Request) -> HandlerResult {
///     let guid = ctx.param("guid").unwrap_or_default();
///     HandlerResponse::ok().with_body(&serde_json::json!({ "guid": guid }))
/// }
///
/// let route = hermes_core::Route::get("/v3/spaces/{guid}", get_space);
/// assert_eq!(route.pattern(), "/v3/spaces/{guid}");
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Runs the handler.
    fn call(&self, ctx: RequestContext, request: Request) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx, request))
    }
}

/// A method, a path pattern and the handler serving them.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: String,
    handler: Arc<dyn Handler>,
}

impl Route {
    /// Declares a route. Patterns use `{name}` for path parameters.
    pub fn new(method: Method, pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handler: Arc::new(handler),
        }
    }

    /// `GET` route.
    pub fn get(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::GET, pattern, handler)
    }

    /// `POST` route.
    pub fn post(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::POST, pattern, handler)
    }

    /// `PUT` route.
    pub fn put(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PUT, pattern, handler)
    }

    /// `PATCH` route.
    pub fn patch(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::PATCH, pattern, handler)
    }

    /// `DELETE` route.
    pub fn delete(pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self::new(Method::DELETE, pattern, handler)
    }

    /// The route's method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The route's path pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The route's handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Splits the route into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Method, String, Arc<dyn Handler>) {
        (self.method, self.pattern, self.handler)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// A resource group that contributes routes.
///
/// Authenticated routes only run with an identity attached; unauthenticated
/// routes run regardless.
pub trait Routable: Send + Sync {
    /// Routes that require an identity.
    fn authenticated_routes(&self) -> Vec<Route> {
        Vec::new()
    }

    /// Routes that do not.
    fn unauthenticated_routes(&self) -> Vec<Route> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthInfo, ErrorKind};

    async fn whoami(ctx: RequestContext, _req: Request) -> HandlerResult {
        let info = ctx.require_auth_info()?;
        HandlerResponse::ok().with_body(&serde_json::json!({ "token": info.token }))
    }

    struct Spaces;

    impl Routable for Spaces {
        fn authenticated_routes(&self) -> Vec<Route> {
            vec![
                Route::get("/v3/spaces", whoami),
                Route::delete("/v3/spaces/{guid}", whoami),
            ]
        }
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let route = Route::get("/whoami", whoami);
        let ctx = RequestContext::mock().with_auth_info(AuthInfo::from_token("abc"));

        let response = route
            .handler()
            .call(ctx, Request::new(Bytes::new()))
            .await
            .unwrap();
        assert_eq!(response.body().unwrap()["token"], "abc");
    }

    #[tokio::test]
    async fn test_fn_handler_error() {
        let route = Route::get("/whoami", whoami);
        let err = route
            .handler()
            .call(RequestContext::mock(), Request::new(Bytes::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
    }

    #[test]
    fn test_routable_defaults() {
        let routes = Spaces.authenticated_routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1].method(), Method::DELETE);
        assert!(Spaces.unauthenticated_routes().is_empty());
    }

    #[test]
    fn test_route_debug_omits_handler() {
        let debug = format!("{:?}", Route::post("/v3/apps", whoami));
        assert!(debug.contains("POST"));
        assert!(debug.contains("/v3/apps"));
    }
}
