//! Registration errors.

use http::Method;
use thiserror::Error;

/// A route table could not accept a registration.
///
/// All of these are detected while the table is being built; matching never
/// fails with an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteConflict {
    /// The same method and path pattern were registered twice.
    #[error("route {method} {pattern} is registered more than once")]
    Duplicate {
        /// The repeated method.
        method: Method,
        /// The repeated path pattern.
        pattern: String,
    },

    /// Two patterns use different parameter names at the same position.
    #[error("parameter {{{found}}} in {pattern} conflicts with existing {{{existing}}}")]
    ParamName {
        /// The pattern being registered.
        pattern: String,
        /// Name already present in the tree.
        existing: String,
        /// Name used by the new pattern.
        found: String,
    },

    /// The pattern is not well formed.
    #[error("invalid path pattern {pattern}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let err = RouteConflict::Duplicate {
            method: Method::GET,
            pattern: "/v3/apps/{guid}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "route GET /v3/apps/{guid} is registered more than once"
        );
    }

    #[test]
    fn test_param_name_display() {
        let err = RouteConflict::ParamName {
            pattern: "/v3/apps/{name}".to_string(),
            existing: "guid".to_string(),
            found: "name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parameter {name} in /v3/apps/{name} conflicts with existing {guid}"
        );
    }
}
