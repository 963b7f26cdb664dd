use thiserror::Error;

/// Failures building a test request or reading its response.
#[derive(Debug, Error)]
pub enum TestError {
    /// A header name or value was rejected.
    #[error("invalid header '{name}'")]
    InvalidHeader {
        /// The header as given.
        name: String,
    },

    /// Method, URI or headers did not form a request.
    #[error("invalid request")]
    Request(#[from] http::Error),

    /// Body (de)serialization failed.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// The body is not UTF-8.
    #[error("body is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
