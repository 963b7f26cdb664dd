use thiserror::Error;

/// Failures installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level string is not a valid filter directive.
    #[error("invalid log filter '{filter}'")]
    InvalidFilter {
        /// The directive as configured.
        filter: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// Another global subscriber was installed first.
    #[error("a global log subscriber is already installed")]
    AlreadyInitialized(#[source] tracing_subscriber::util::TryInitError),
}
