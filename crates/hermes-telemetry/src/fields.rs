//! Field names used on the `request` span and its events.

/// Span name for one dispatched request.
pub const REQUEST_SPAN: &str = "request";

/// Correlation id of the request.
pub const CORRELATION_ID: &str = "correlation_id";

/// Request method.
pub const HTTP_METHOD: &str = "http.method";

/// Request path as received.
pub const HTTP_PATH: &str = "http.path";

/// Registered pattern that matched, recorded once routed.
pub const HTTP_ROUTE: &str = "http.route";

/// Response status code.
pub const HTTP_STATUS: &str = "http.status";

/// Milliseconds from dispatch to response.
pub const ELAPSED_MS: &str = "elapsed_ms";

/// Title of the error kind on failed requests.
pub const ERROR_KIND: &str = "error.kind";

/// Cause chain of a failed request.
pub const ERROR_CAUSE: &str = "error.cause";
