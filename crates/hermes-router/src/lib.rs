//! Radix tree route table for Hermes.
//!
//! Maps an HTTP method and request path to a registered value, capturing
//! `{name}` path parameters along the way. The table is generic over the
//! value so the dispatcher can store its wrapped handlers directly.
//!
//! # Example
//!
//! ```rust
//! use hermes_router::{RouteLookup, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/v3/spaces/{guid}", "getSpace").unwrap();
//! router.insert(Method::DELETE, "/v3/spaces/{guid}", "deleteSpace").unwrap();
//!
//! assert!(matches!(
//!     router.lookup(&Method::PUT, "/v3/spaces/s1"),
//!     RouteLookup::MethodNotAllowed { .. }
//! ));
//! assert!(matches!(router.lookup(&Method::GET, "/v3/nope"), RouteLookup::NotFound));
//! ```
//!
//! Registering the same method and pattern twice is an error, reported by
//! [`Router::insert`] as [`RouteConflict::Duplicate`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_table;
mod node;
mod params;
mod router;

pub use error::RouteConflict;
pub use method_table::MethodTable;
pub use node::{Node, PathMatch, SegmentKind};
pub use params::Params;
pub use router::{RouteLookup, Router};
