//! Route table: immutable-once-built method+path lookup.

use std::collections::HashMap;
use thiserror::Error;
use trellis_core::{MatchedRoute, Method, Route};

/// A route pattern that `matchit` refused.
#[derive(Error, Debug)]
#[error("invalid route pattern `{pattern}`: {source}")]
pub struct RouteInsertError {
    pattern: String,
    source: matchit::InsertError,
}

/// Mapping from (method, path pattern) to a route.
///
/// Path patterns go through a `matchit` router; each known pattern owns one
/// slot holding its per-method routes. Inserting an identical (method,
/// pattern) key again replaces the previous route: last write wins. The
/// table is treated as read-only once the kernel is built.
#[derive(Default)]
pub struct RouteTable {
    inner: matchit::Router<usize>,
    patterns: HashMap<String, usize>,
    slots: Vec<HashMap<Method, Route>>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route. Duplicate (method, pattern) keys replace the earlier
    /// entry; an invalid pattern is an error.
    pub fn insert(&mut self, route: Route) -> Result<(), RouteInsertError> {
        let slot = match self.patterns.get(&route.path) {
            Some(&slot) => slot,
            None => {
                let slot = self.slots.len();
                self.inner
                    .insert(route.path.clone(), slot)
                    .map_err(|source| RouteInsertError {
                        pattern: route.path.clone(),
                        source,
                    })?;
                self.patterns.insert(route.path.clone(), slot);
                self.slots.push(HashMap::new());
                slot
            }
        };
        self.slots[slot].insert(route.method.clone(), route);
        Ok(())
    }

    /// Match a concrete request against the table, binding `{param}`
    /// captures from the path.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<MatchedRoute> {
        let matched = self.inner.at(path).ok()?;
        let route = self.slots[*matched.value].get(method)?;
        let params = matched
            .params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Some(MatchedRoute {
            route: route.clone(),
            params,
        })
    }

    /// Total number of routes.
    pub fn len(&self) -> usize {
        self.slots.iter().map(HashMap::len).sum()
    }

    /// Whether the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
