//! The response envelope handlers return.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::Serialize;

use crate::error::ApiError;

/// Status, optional JSON body and headers produced by a handler.
///
/// Handlers never touch the wire; the dispatcher turns this into the HTTP
/// response. Headers are additive, so the same name can be set repeatedly
/// (pagination `Link` headers, for example).
///
/// # Example
///
/// ```
/// use hermes_core::HandlerResponse;
/// use http::{header, HeaderValue, StatusCode};
///
/// let response = HandlerResponse::new(StatusCode::ACCEPTED)
///     .with_header(header::LOCATION, HeaderValue::from_static("/v3/jobs/j1"));
///
/// assert_eq!(response.status(), StatusCode::ACCEPTED);
/// assert!(response.body().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    status: StatusCode,
    body: Option<serde_json::Value>,
    headers: HeaderMap,
}

impl HandlerResponse {
    /// An empty response with `status`.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// 200 OK.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// 201 Created.
    #[must_use]
    pub fn created() -> Self {
        Self::new(StatusCode::CREATED)
    }

    /// 202 Accepted.
    #[must_use]
    pub fn accepted() -> Self {
        Self::new(StatusCode::ACCEPTED)
    }

    /// 204 No Content. Stays bodyless.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// Sets the body from any serializable value.
    ///
    /// Fails with [`crate::ErrorKind::Unknown`] if the value cannot be
    /// represented as JSON.
    pub fn with_body<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::unknown(e).context("serializing response body"))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Sets an already-built JSON body.
    #[must_use]
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends a header. Existing values for `name` are kept.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Splits the envelope for writing.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Option<serde_json::Value>, HeaderMap) {
        (self.status, self.body, self.headers)
    }
}
