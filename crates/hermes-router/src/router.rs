//! The route table.

use http::Method;

use crate::error::RouteConflict;
use crate::node::{Node, PathMatch};
use crate::params::Params;

/// Result of looking up a request in a [`Router`].
#[derive(Debug, PartialEq, Eq)]
pub enum RouteLookup<'a, T> {
    /// Path and method matched a registration.
    Matched {
        /// The registered value.
        value: &'a T,
        /// Parameters captured from the path.
        params: Params,
    },
    /// The path is known but no registration for it holds this method.
    MethodNotAllowed {
        /// Methods registered on any pattern matching the path.
        allowed: Vec<Method>,
    },
    /// No registration covers the path.
    NotFound,
}

/// A radix tree route table mapping method and path to a value.
///
/// The table is built once and then only read, so it can be shared between
/// connection tasks behind an `Arc` without locking.
///
/// # Example
///
/// ```rust
/// use hermes_router::{RouteLookup, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(Method::GET, "/v3/apps/{guid}", "getApp").unwrap();
///
/// match router.lookup(&Method::GET, "/v3/apps/123") {
///     RouteLookup::Matched { value, params } => {
///         assert_eq!(*value, "getApp");
///         assert_eq!(params.get("guid"), Some("123"));
///     }
///     other => panic!("unexpected lookup: {other:?}"),
/// }
/// ```
///
/// # Priority
///
/// Literal segments are preferred over `{param}` segments, so
/// `/v3/apps/summary` wins over `/v3/apps/{guid}` for that exact path.
/// A literal segment only wins if its branch holds the request's method;
/// `DELETE /v3/spaces/summary` still reaches `DELETE /v3/spaces/{guid}` when
/// `/v3/spaces/summary` is registered for `GET` only. Trailing and repeated
/// slashes are ignored, and segments are percent-decoded before matching.
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers `value` for `method` on `pattern`.
    ///
    /// Fails if the method and pattern pair already exists, or if the
    /// pattern is malformed.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) -> Result<(), RouteConflict> {
        self.root.insert(pattern, method, value)?;
        self.route_count += 1;
        Ok(())
    }

    /// Looks up the value for `method` and `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_, T> {
        match self.root.match_path(method, path) {
            PathMatch::Found { value, params } => RouteLookup::Matched { value, params },
            PathMatch::WrongMethod { allowed } => RouteLookup::MethodNotAllowed { allowed },
            PathMatch::Missing => RouteLookup::NotFound,
        }
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
