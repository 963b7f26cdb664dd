//! Radix tree node.
//!
//! Each node owns one path segment. Static children are kept sorted so a
//! lookup is a binary search; at most one `{param}` child exists per node.

use std::borrow::Cow;

use http::Method;

use crate::error::RouteConflict;
use crate::method_table::MethodTable;
use crate::params::Params;

/// Kind of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment such as `v3` or `apps`.
    Static,
    /// Named parameter such as `{guid}`.
    Param(String),
}

/// Outcome of matching a method and path against the tree.
#[derive(Debug, PartialEq, Eq)]
pub enum PathMatch<'a, T> {
    /// A node on the path holds the method.
    Found {
        /// The registered value.
        value: &'a T,
        /// Parameters captured along the winning branch.
        params: Params,
    },
    /// The path exists but none of its nodes hold the method.
    WrongMethod {
        /// Methods registered on any node matching the path.
        allowed: Vec<Method>,
    },
    /// No node matches the path.
    Missing,
}

/// A node in the route tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The raw segment text (`apps`, `{guid}`).
    pub segment: String,
    /// Whether the segment is literal or a parameter.
    pub kind: SegmentKind,
    /// Values registered for the path ending at this node.
    pub methods: Option<MethodTable<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
        }
    }

    /// Creates the root of an empty tree.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind("", SegmentKind::Static)
    }

    /// Registers `value` for `method` on `pattern`.
    pub fn insert(&mut self, pattern: &str, method: Method, value: T) -> Result<(), RouteConflict> {
        let segments = parse_pattern(pattern)?;
        let leaf = self.descend_or_create(pattern, &segments)?;
        let table = leaf.methods.get_or_insert_with(MethodTable::new);
        table
            .insert(method.clone(), value)
            .map_err(|_| RouteConflict::Duplicate {
                method,
                pattern: pattern.to_string(),
            })
    }

    fn descend_or_create(
        &mut self,
        pattern: &str,
        segments: &[(String, SegmentKind)],
    ) -> Result<&mut Self, RouteConflict> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return Ok(self);
        };

        match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::with_kind(segment.clone(), SegmentKind::Static));
                        index
                    }
                };
                self.static_children[index].descend_or_create(pattern, remaining)
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::with_kind(segment.clone(), kind.clone())));
                if let SegmentKind::Param(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteConflict::ParamName {
                            pattern: pattern.to_string(),
                            existing: existing.clone(),
                            found: name.clone(),
                        });
                    }
                }
                child.descend_or_create(pattern, remaining)
            }
        }
    }

    /// Finds the value registered for `method` on `path`, capturing
    /// parameters on the way.
    ///
    /// Static segments win over parameters. A branch is only accepted if it
    /// ends on a node holding `method`; otherwise the search backtracks into
    /// the parameter branch. Every path-complete node that lacked the method
    /// contributes its methods to the returned allow list, which is only
    /// meaningful when no value was found.
    ///
    /// Segments are percent-decoded before matching, so captured values are
    /// the decoded text. An encoded `/` stays inside its segment.
    #[must_use]
    pub fn match_path(&self, method: &Method, path: &str) -> PathMatch<'_, T> {
        let segments: Vec<Cow<'_, str>> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).unwrap_or(Cow::Borrowed(s)))
            .collect();
        let mut params = Params::new();
        let mut allowed = Vec::new();

        match self.match_segments(method, &segments, &mut params, &mut allowed) {
            Some(value) => PathMatch::Found { value, params },
            None if allowed.is_empty() => PathMatch::Missing,
            None => PathMatch::WrongMethod { allowed },
        }
    }

    fn match_segments<'a>(
        &'a self,
        method: &Method,
        segments: &[Cow<'_, str>],
        params: &mut Params,
        allowed: &mut Vec<Method>,
    ) -> Option<&'a T> {
        let Some((segment, remaining)) = segments.split_first() else {
            let table = self.methods.as_ref()?;
            if let Some(value) = table.get(method) {
                return Some(value);
            }
            for m in table.allowed_methods() {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
            return None;
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(method, remaining, params, allowed) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), segment.to_string());
                if let Some(found) = child.match_segments(method, remaining, params, allowed) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Self> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<(String, SegmentKind)>, RouteConflict> {
    let invalid = |reason| RouteConflict::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    if !pattern.starts_with('/') {
        return Err(invalid("pattern must start with '/'"));
    }

    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("parameter name must be non-empty"));
                }
                Ok((s.to_string(), SegmentKind::Param(name.to_string())))
            } else if s.contains(['{', '}']) {
                Err(invalid("parameters must span a whole segment"))
            } else {
                Ok((s.to_string(), SegmentKind::Static))
            }
        })
        .collect()
}
