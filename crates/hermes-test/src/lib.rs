//! # Hermes Test
//!
//! Drives a [`Dispatcher`](hermes_server::Dispatcher) in memory, without
//! binding a socket.
//!
//! ```rust
//! use hermes_core::{ErrorKind, HandlerResponse, Request, RequestContext, Routable, Route};
//! use hermes_server::RouterBuilder;
//! use hermes_test::{StubAuth, TestClient};
//! use http::StatusCode;
//!
//! struct Me;
//!
//! impl Routable for Me {
//!     fn authenticated_routes(&self) -> Vec<Route> {
//!         vec![Route::get("/v3/me", |ctx: RequestContext, _req: Request| async move {
//!             let token = ctx.require_auth_info()?.token.clone();
//!             HandlerResponse::ok().with_body(&serde_json::json!({ "token": token }))
//!         })]
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let dispatcher = RouterBuilder::new()
//!     .load_routes(&Me)
//!     .use_auth_middleware(StubAuth)
//!     .build()
//!     .unwrap();
//! let client = TestClient::new(dispatcher);
//!
//! client.get("/v3/me").send().await.assert_error(ErrorKind::NotAuthenticated);
//!
//! let response = client.get("/v3/me").bearer_token("abc").send().await;
//! response.assert_status(StatusCode::OK);
//! assert_eq!(response.json_value().unwrap()["token"], "abc");
//! # });
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod auth;
mod client;
mod error;
mod response;

pub use auth::StubAuth;
pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use response::TestResponse;
