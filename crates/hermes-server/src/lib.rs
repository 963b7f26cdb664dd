//! # Hermes Server
//!
//! Turns a set of [`Routable`](hermes_core::Routable) components into a
//! running HTTP API.
//!
//! - [`RouterBuilder`] collects routes, middleware and fallback handlers
//! - [`Dispatcher`] is the frozen result and serves one request at a time
//!   from any number of tasks
//! - [`Server`] feeds it from a hyper HTTP/1 listener with graceful
//!   shutdown
//!
//! Failures never escape as transport errors: every request ends with
//! either the handler's response or a `{"errors":[...]}` envelope, and
//! every response carries the request's correlation id.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod config;
mod dispatcher;
mod middleware;
mod response;
mod server;
mod shutdown;

pub use builder::{RouterBuilder, CORRELATION_ID_HEADER};
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_SIZE,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use dispatcher::Dispatcher;
pub use hermes_core::BoxFuture;
pub use middleware::{Middleware, Next};
pub use response::{error_response, HttpResponse};
pub use server::{Server, ServerError};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
