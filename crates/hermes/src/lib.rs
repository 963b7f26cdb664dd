//! # Hermes
//!
//! The request dispatch core of a Cloud Foundry style REST API.
//!
//! Components register [`Route`](core::Route)s through
//! [`Routable`](core::Routable); the [`RouterBuilder`](server::RouterBuilder)
//! freezes them into a [`Dispatcher`](server::Dispatcher) which resolves the
//! handler, enforces authentication, decodes and validates input through
//! [`DecoderValidator`](extract::DecoderValidator), and renders either the
//! handler's response or the `{"errors":[...]}` envelope of an
//! [`ApiError`](core::ApiError).
//!
//! ```rust,no_run
//! use hermes::prelude::*;
//!
//! struct Info;
//!
//! impl Routable for Info {
//!     fn unauthenticated_routes(&self) -> Vec<Route> {
//!         vec![Route::get("/", |_ctx: RequestContext, _req: Request| async {
//!             HandlerResponse::ok().with_body(&serde_json::json!({ "name": "hermes" }))
//!         })]
//!     }
//! }
//!
//! # async fn start() -> Result<(), hermes::GatewayError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hermes.toml")?
//!     .with_process_env()
//!     .load()?;
//! let dispatcher = hermes::router_builder(&config)?.load_routes(&Info).build()?;
//! hermes::serve(&config, dispatcher).await
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod gateway;

pub use hermes_config as config;
pub use hermes_core as core;
pub use hermes_extract as extract;
pub use hermes_router as router;
pub use hermes_server as server;
pub use hermes_telemetry as telemetry;

pub use gateway::{router_builder, serve, server_config, GatewayError};

/// The types most handlers and components need.
pub mod prelude {
    pub use hermes_config::{ConfigLoader, GatewayConfig};
    pub use hermes_core::{
        ApiError, ApiResult, AuthInfo, ErrorKind, HandlerResponse, HandlerResult, Request,
        RequestContext, ResultExt, Routable, Route,
    };
    pub use hermes_extract::{DecoderValidator, KeyedPayload, Validate, ValidationErrors};
    pub use hermes_server::{Dispatcher, Middleware, Next, RouterBuilder};
}
