//! Per-path method dispatch.
//!
//! A [`MethodTable`] holds the values registered for one path pattern, keyed
//! by HTTP method. Any method is accepted, including extension methods.

use http::Method;

/// Values registered for a single path, keyed by method.
///
/// # Example
///
/// ```rust
/// use hermes_router::MethodTable;
/// use http::Method;
///
/// let mut table = MethodTable::new();
/// table.insert(Method::GET, "getApp").unwrap();
/// table.insert(Method::PATCH, "updateApp").unwrap();
///
/// assert_eq!(table.get(&Method::GET), Some(&"getApp"));
/// assert_eq!(table.get(&Method::DELETE), None);
/// assert!(table.insert(Method::GET, "other").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MethodTable<T> {
    entries: Vec<(Method, T)>,
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> MethodTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` for `method`.
    ///
    /// Returns the rejected value if the method already has an entry; the
    /// existing registration is left untouched.
    pub fn insert(&mut self, method: Method, value: T) -> Result<(), T> {
        if self.contains(&method) {
            return Err(value);
        }
        self.entries.push((method, value));
        Ok(())
    }

    /// Returns the value registered for `method`.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
    }

    /// Returns true if `method` has an entry.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.entries.iter().any(|(m, _)| m == method)
    }

    /// Methods registered on this path, in registration order.
    pub fn allowed_methods(&self) -> impl Iterator<Item = &Method> {
        self.entries.iter().map(|(m, _)| m)
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
