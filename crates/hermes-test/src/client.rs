use std::sync::Arc;

use bytes::Bytes;
use hermes_server::Dispatcher;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::error::TestError;
use crate::response::TestResponse;

/// Sends requests straight into a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct TestClient {
    dispatcher: Arc<Dispatcher>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// A client for `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::shared(Arc::new(dispatcher))
    }

    /// A client for a dispatcher that is also used elsewhere.
    #[must_use]
    pub fn shared(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a GET.
    pub fn get(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST.
    pub fn post(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT.
    pub fn put(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH.
    pub fn patch(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE.
    pub fn delete(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            method,
            uri: uri.into(),
            headers: self.default_headers.clone(),
            body: Bytes::new(),
            pending_error: None,
        }
    }
}

/// A request being built by a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    pending_error: Option<TestError>,
}

impl TestClientRequest<'_> {
    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sends `Authorization: bearer <token>`.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        let value = format!("bearer {}", token.as_ref());
        self.header(AUTHORIZATION.as_str(), value)
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.header(CONTENT_TYPE.as_str(), "application/json")
            }
            Err(err) => {
                self.pending_error = Some(err.into());
                self
            }
        }
    }

    /// Dispatches the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("test request failed: {err}"),
        }
    }

    /// Dispatches the request, reporting build failures.
    ///
    /// # Errors
    ///
    /// Returns a [`TestError`] for bad headers, URIs or bodies.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        if let Some(err) = self.pending_error {
            return Err(err);
        }

        let mut builder = http::Request::builder().method(self.method).uri(self.uri.as_str());
        for (name, value) in &self.headers {
            let name_parsed = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TestError::InvalidHeader { name: name.clone() })?;
            let value_parsed = HeaderValue::from_str(value)
                .map_err(|_| TestError::InvalidHeader { name: name.clone() })?;
            builder = builder.header(name_parsed, value_parsed);
        }
        let request = builder.body(self.body)?;

        let response = self.client.dispatcher.dispatch(request).await;
        Ok(TestResponse::from_http(response).await)
    }
}
