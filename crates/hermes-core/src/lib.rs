//! # Hermes Core
//!
//! The types every other Hermes crate speaks:
//!
//! - [`ApiError`] / [`ErrorKind`]: the closed error taxonomy and its
//!   translation helpers
//! - [`ErrorsResponse`]: the `{"errors":[...]}` wire body
//! - [`HandlerResponse`]: what a handler returns on success
//! - [`AuthInfo`]: the caller identity attached by upstream middleware
//! - [`RequestContext`] / [`CorrelationId`]: per-request state passed to handlers
//! - [`Handler`], [`Route`], [`Routable`]: the handler contract

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod identity;
mod response;

pub use context::{CorrelationId, RequestContext, MAX_CORRELATION_ID_LEN};
pub use error::{
    ApiError, ApiResult, BackendFailure, BackendReason, ErrorBody, ErrorKind, ErrorsResponse,
    ResultExt,
};
pub use handler::{BoxFuture, Handler, HandlerResult, Request, Routable, Route};
pub use identity::AuthInfo;
pub use response::HandlerResponse;
