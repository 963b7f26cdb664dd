//! Assembling the route table.

use std::sync::Arc;

use hermes_core::{ApiError, Handler, HandlerResult, Request, RequestContext, Routable, Route};
use hermes_router::{RouteConflict, Router};
use http::HeaderName;

use crate::dispatcher::{Dispatcher, Endpoint};
use crate::middleware::Middleware;

/// Default header carrying the correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Collects routes, middleware and fallbacks, then freezes them into a
/// [`Dispatcher`].
///
/// Common middleware runs on every request, matched or not, in the order
/// it was added. Auth middleware runs after the common middleware and only
/// on routes that a [`Routable`] listed as authenticated.
///
/// # Example
///
/// ```
/// use hermes_core::{ApiError, HandlerResponse, RequestContext, Request, Routable, Route};
/// use hermes_server::RouterBuilder;
///
/// struct Info;
///
/// impl Routable for Info {
///     fn unauthenticated_routes(&self) -> Vec<Route> {
///         vec![Route::get("/v3/info", |_ctx: RequestContext, _req: Request| async {
///             Ok::<_, ApiError>(HandlerResponse::ok())
///         })]
///     }
/// }
///
/// let dispatcher = RouterBuilder::new().load_routes(&Info).build().unwrap();
/// assert_eq!(dispatcher.route_count(), 1);
/// ```
#[must_use]
pub struct RouterBuilder {
    routes: Vec<(Route, bool)>,
    common: Vec<Arc<dyn Middleware>>,
    auth: Vec<Arc<dyn Middleware>>,
    not_found: Arc<dyn Handler>,
    method_not_allowed: Arc<dyn Handler>,
    correlation_header: HeaderName,
    trust_incoming_correlation: bool,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    /// An empty builder with the default fallbacks.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            common: Vec::new(),
            auth: Vec::new(),
            not_found: Arc::new(endpoint_not_found),
            method_not_allowed: Arc::new(endpoint_not_found),
            correlation_header: HeaderName::from_static(CORRELATION_ID_HEADER),
            trust_incoming_correlation: true,
        }
    }

    /// Registers every route a component exposes.
    pub fn load_routes(mut self, routable: &dyn Routable) -> Self {
        self.routes
            .extend(routable.authenticated_routes().into_iter().map(|route| (route, true)));
        self.routes
            .extend(routable.unauthenticated_routes().into_iter().map(|route| (route, false)));
        self
    }

    /// Adds middleware that runs on every request.
    pub fn use_middleware(mut self, middleware: impl Middleware) -> Self {
        self.common.push(Arc::new(middleware));
        self
    }

    /// Adds middleware that runs only in front of authenticated routes.
    ///
    /// This is where the caller identity is resolved and attached.
    pub fn use_auth_middleware(mut self, middleware: impl Middleware) -> Self {
        self.auth.push(Arc::new(middleware));
        self
    }

    /// Replaces the handler for paths nothing is registered on.
    pub fn set_not_found_handler(mut self, handler: impl Handler) -> Self {
        self.not_found = Arc::new(handler);
        self
    }

    /// Replaces the handler for known paths requested with an unregistered
    /// method.
    pub fn set_method_not_allowed_handler(mut self, handler: impl Handler) -> Self {
        self.method_not_allowed = Arc::new(handler);
        self
    }

    /// Header the correlation id is read from and echoed on.
    pub fn correlation_header(mut self, header: HeaderName) -> Self {
        self.correlation_header = header;
        self
    }

    /// Whether a well-formed incoming correlation id is reused. When off,
    /// every request gets a fresh id.
    pub const fn trust_incoming_correlation(mut self, trust: bool) -> Self {
        self.trust_incoming_correlation = trust;
        self
    }

    /// Builds the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns the first [`RouteConflict`]: a method and pattern registered
    /// twice, or a malformed pattern.
    pub fn build(self) -> Result<Dispatcher, RouteConflict> {
        let mut routes = Router::new();
        for (route, authenticated) in self.routes {
            let (method, pattern, handler) = route.into_parts();
            let endpoint = Endpoint {
                pattern: pattern.clone(),
                handler,
                authenticated,
            };
            routes.insert(method, &pattern, endpoint)?;
        }

        tracing::debug!(
            routes = routes.len(),
            middleware = self.common.len(),
            auth_middleware = self.auth.len(),
            "route table built"
        );

        Ok(Dispatcher {
            routes,
            common: self.common,
            auth: self.auth,
            not_found: self.not_found,
            method_not_allowed: self.method_not_allowed,
            correlation_header: self.correlation_header,
            trust_incoming_correlation: self.trust_incoming_correlation,
        })
    }
}

async fn endpoint_not_found(_ctx: RequestContext, _request: Request) -> HandlerResult {
    Err(ApiError::not_found("Endpoint"))
}
