//! Per-request dispatch.
//!
//! For each request the dispatcher:
//!
//! 1. resolves the correlation id and opens the `request` span
//! 2. runs the common middleware
//! 3. looks the request up in the route table
//! 4. on authenticated routes, runs the auth middleware and refuses to go
//!    further without an attached [`AuthInfo`]
//! 5. builds the [`RequestContext`] and awaits the handler inside the span
//! 6. writes either the handler's response or the error envelope
//!
//! Every response echoes the correlation id.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use hermes_core::{
    ApiError, AuthInfo, BoxFuture, CorrelationId, ErrorKind, Handler, HandlerResult, Request,
    RequestContext,
};
use hermes_router::{Params, RouteLookup, Router};
use http::header::ALLOW;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::{Instrument, Span};

use crate::builder::RouterBuilder;
use crate::middleware::{Middleware, Next};
use crate::response::{self, HttpResponse};

/// A registered handler and how it is guarded.
pub(crate) struct Endpoint {
    pub(crate) pattern: String,
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) authenticated: bool,
}

/// The frozen route table plus middleware, shared by every connection.
///
/// Built by [`RouterBuilder::build`]; nothing about it changes afterwards.
pub struct Dispatcher {
    pub(crate) routes: Router<Endpoint>,
    pub(crate) common: Vec<Arc<dyn Middleware>>,
    pub(crate) auth: Vec<Arc<dyn Middleware>>,
    pub(crate) not_found: Arc<dyn Handler>,
    pub(crate) method_not_allowed: Arc<dyn Handler>,
    pub(crate) correlation_header: HeaderName,
    pub(crate) trust_incoming_correlation: bool,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("middleware", &self.common.len())
            .field("auth_middleware", &self.auth.len())
            .field("correlation_header", &self.correlation_header)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Shorthand for [`RouterBuilder::new`].
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Number of registered method and pattern pairs.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// The header the correlation id travels in.
    #[must_use]
    pub const fn correlation_header(&self) -> &HeaderName {
        &self.correlation_header
    }

    /// Serves one buffered request.
    pub async fn dispatch(&self, mut request: Request) -> HttpResponse {
        let correlation_id = self.correlation_id(request.headers());
        let span = tracing::info_span!(
            "request",
            correlation_id = %correlation_id,
            http.method = %request.method(),
            http.path = %request.uri().path(),
            http.route = tracing::field::Empty,
        );
        request.extensions_mut().insert(correlation_id.clone());
        let started = Instant::now();

        let route_id = correlation_id.clone();
        let route_span = span.clone();
        let next = Next::new(&self.common, move |request| {
            self.route(request, route_id, route_span)
        });
        let mut response = next.run(request).instrument(span.clone()).await;

        self.echo_correlation_id(&mut response, &correlation_id);
        tracing::info!(
            parent: &span,
            http.status = response.status().as_u16(),
            elapsed_ms = elapsed_ms(started),
            "request completed"
        );
        response
    }

    /// Answers a request that could not be read with an error envelope.
    ///
    /// Used by the server when the body cannot be buffered, so such
    /// requests are logged and correlated like any other.
    pub fn reject(&self, method: &Method, path: &str, headers: &HeaderMap, err: &ApiError) -> HttpResponse {
        let correlation_id = self.correlation_id(headers);
        let span = tracing::info_span!(
            "request",
            correlation_id = %correlation_id,
            http.method = %method,
            http.path = %path,
            http.route = tracing::field::Empty,
        );
        log_failure(err, &span);
        let mut response = response::error_response(err);
        self.echo_correlation_id(&mut response, &correlation_id);
        response
    }

    fn correlation_id(&self, headers: &HeaderMap) -> CorrelationId {
        if !self.trust_incoming_correlation {
            return CorrelationId::new();
        }
        headers
            .get(&self.correlation_header)
            .and_then(|value| value.to_str().ok())
            .and_then(CorrelationId::from_header)
            .unwrap_or_default()
    }

    fn echo_correlation_id(&self, response: &mut HttpResponse, correlation_id: &CorrelationId) {
        if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
            response
                .headers_mut()
                .insert(self.correlation_header.clone(), value);
        }
    }

    fn route(&self, request: Request, correlation_id: CorrelationId, span: Span) -> BoxFuture<'_, HttpResponse> {
        Box::pin(async move {
            let method = request.method().clone();
            let path = request.uri().path().to_string();

            match self.routes.lookup(&method, &path) {
                RouteLookup::Matched { value, params } => {
                    span.record("http.route", value.pattern.as_str());
                    if value.authenticated {
                        let next = Next::new(&self.auth, move |request| {
                            guarded(value, request, params, correlation_id, span)
                        });
                        next.run(request).await
                    } else {
                        invoke(value, request, params, correlation_id, span).await
                    }
                }
                RouteLookup::MethodNotAllowed { allowed } => {
                    let mut response =
                        call(&self.method_not_allowed, request, Params::new(), correlation_id, span).await;
                    if let Ok(value) = HeaderValue::from_str(&join_methods(&allowed)) {
                        response.headers_mut().insert(ALLOW, value);
                    }
                    response
                }
                RouteLookup::NotFound => {
                    call(&self.not_found, request, Params::new(), correlation_id, span).await
                }
            }
        })
    }
}

fn guarded<'a>(
    endpoint: &'a Endpoint,
    request: Request,
    params: Params,
    correlation_id: CorrelationId,
    span: Span,
) -> BoxFuture<'a, HttpResponse> {
    Box::pin(invoke(endpoint, request, params, correlation_id, span))
}

async fn invoke(
    endpoint: &Endpoint,
    request: Request,
    params: Params,
    correlation_id: CorrelationId,
    span: Span,
) -> HttpResponse {
    if endpoint.authenticated && AuthInfo::from_extensions(request.extensions()).is_none() {
        return finish(Err(ApiError::not_authenticated()), &span);
    }
    call(&endpoint.handler, request, params, correlation_id, span).await
}

async fn call(
    handler: &Arc<dyn Handler>,
    request: Request,
    params: Params,
    correlation_id: CorrelationId,
    span: Span,
) -> HttpResponse {
    let mut ctx = RequestContext::new(correlation_id)
        .with_logger(span.clone())
        .with_params(params);
    if let Some(auth_info) = AuthInfo::from_extensions(request.extensions()) {
        ctx = ctx.with_auth_info(auth_info.clone());
    }

    let result = handler.call(ctx, request).instrument(span.clone()).await;
    finish(result, &span)
}

fn finish(result: HandlerResult, span: &Span) -> HttpResponse {
    match result {
        Ok(response) => response::from_handler(response),
        Err(err) => {
            log_failure(&err, span);
            response::error_response(&err)
        }
    }
}

fn log_failure(err: &ApiError, span: &Span) {
    let cause = err.cause().map(ToString::to_string).unwrap_or_default();
    let context = err.context_messages().collect::<Vec<_>>().join(": ");
    let mut fields = String::new();
    for (key, value) in err.fields() {
        if !fields.is_empty() {
            fields.push(' ');
        }
        let _ = write!(fields, "{key}={value}");
    }

    if err.is(ErrorKind::Unknown) {
        tracing::error!(
            parent: span,
            error.kind = %err.kind(),
            error.code = err.kind().code(),
            error.cause = %cause,
            error.context = %context,
            error.fields = %fields,
            "request failed"
        );
    } else {
        tracing::info!(
            parent: span,
            error.kind = %err.kind(),
            error.code = err.kind().code(),
            error.detail = err.detail(),
            error.cause = %cause,
            error.context = %context,
            error.fields = %fields,
            "request failed"
        );
    }
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
