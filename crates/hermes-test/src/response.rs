use bytes::Bytes;
use hermes_core::{ErrorKind, ErrorsResponse};
use hermes_server::HttpResponse;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A fully buffered dispatcher response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub(crate) async fn from_http(response: HttpResponse) -> Self {
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if it is text.
    #[must_use]
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Raw body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text.
    ///
    /// # Errors
    ///
    /// Fails if the body is not UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Body decoded as `T`.
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON of that shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as untyped JSON.
    ///
    /// # Errors
    ///
    /// Fails if the body is not JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Body as an error envelope.
    ///
    /// # Errors
    ///
    /// Fails if the body is not an `{"errors":[...]}` document.
    pub fn errors(&self) -> Result<ErrorsResponse, TestError> {
        self.json()
    }

    /// Kind of the first error in the envelope, if the body is one.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.errors().ok()?.errors.first()?.kind()
    }

    /// # Panics
    ///
    /// Panics unless the status is `expected`.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// # Panics
    ///
    /// Panics unless header `name` has the value `expected`.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        match self.header_str(name) {
            Some(actual) => assert_eq!(actual, expected, "header '{name}'"),
            None => panic!("header '{name}' not found"),
        }
        self
    }

    /// # Panics
    ///
    /// Panics if any `Content-Type` header is present.
    pub fn assert_no_content_type(&self) -> &Self {
        assert!(
            self.headers.get(CONTENT_TYPE).is_none(),
            "unexpected content type {:?}",
            self.headers.get(CONTENT_TYPE)
        );
        self
    }

    /// Asserts the response is the envelope for `kind` with its status.
    ///
    /// # Panics
    ///
    /// Panics on a different status, a body that is not an envelope, or an
    /// envelope of another kind.
    pub fn assert_error(&self, kind: ErrorKind) -> &Self {
        self.assert_status(kind.status());
        assert_eq!(self.header_str(CONTENT_TYPE.as_str()), Some("application/json"));
        assert_eq!(self.error_kind(), Some(kind), "body {}", String::from_utf8_lossy(&self.body));
        self
    }
}
