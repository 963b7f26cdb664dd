//! Per-request context handed to handlers.
//!
//! The dispatcher builds a [`RequestContext`] for every routed request and
//! passes it to the handler by value. It is the only way a handler learns
//! who is calling, which correlation id to log with and which path
//! parameters were captured.

use std::time::{Duration, Instant};

use hermes_router::Params;
use serde::{Deserialize, Serialize};
use tracing::Span;
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::AuthInfo;

/// Longest correlation id accepted from a client.
pub const MAX_CORRELATION_ID_LEN: usize = 128;

/// Per-request token used only to correlate log lines.
///
/// Generated ids are UUID v7, so they sort by creation time.
///
/// # Example
///
/// ```
/// use hermes_core::CorrelationId;
///
/// let id = CorrelationId::new();
/// assert_eq!(id.as_str().len(), 36);
///
/// assert!(CorrelationId::from_header("abc-123").is_some());
/// assert!(CorrelationId::from_header("").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Accepts a client-supplied id.
    ///
    /// Rejects empty values, values longer than
    /// [`MAX_CORRELATION_ID_LEN`] and anything outside visible ASCII, since
    /// the id is written verbatim into logs and response headers.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        let acceptable = !value.is_empty()
            && value.len() <= MAX_CORRELATION_ID_LEN
            && value.bytes().all(|b| b.is_ascii_graphic());
        acceptable.then(|| Self(value.to_string()))
    }

    /// The id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

/// Everything a handler may know about the request besides the request
/// itself.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    auth_info: Option<AuthInfo>,
    logger: Span,
    params: Params,
    started_at: Instant,
}

impl RequestContext {
    /// A context with no identity, no parameters and a disabled logger.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            auth_info: None,
            logger: Span::none(),
            params: Params::new(),
            started_at: Instant::now(),
        }
    }

    /// A context with a fresh correlation id, for tests.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(CorrelationId::new())
    }

    /// Sets the caller identity.
    #[must_use]
    pub fn with_auth_info(mut self, auth_info: AuthInfo) -> Self {
        self.auth_info = Some(auth_info);
        self
    }

    /// Sets the request span used as the handler's logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Span) -> Self {
        self.logger = logger;
        self
    }

    /// Sets the captured path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Correlation id for this request.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Caller identity, if one was attached.
    ///
    /// Always `Some` inside handlers registered as authenticated routes.
    #[must_use]
    pub const fn auth_info(&self) -> Option<&AuthInfo> {
        self.auth_info.as_ref()
    }

    /// Caller identity, or a not-authenticated error.
    pub fn require_auth_info(&self) -> Result<&AuthInfo, ApiError> {
        self.auth_info.as_ref().ok_or_else(ApiError::not_authenticated)
    }

    /// Request-scoped logger carrying the correlation id.
    ///
    /// Handler futures already run inside this span, so plain `tracing`
    /// macros pick it up. Use it explicitly with `parent:` from spawned work.
    #[must_use]
    pub const fn logger(&self) -> &Span {
        &self.logger
    }

    /// All captured path parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// A single path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Time since the dispatcher accepted the request.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
