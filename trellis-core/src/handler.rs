//! Handler contract: the terminal point of the dispatch stage.

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;
use serde_json::Value;
use std::fmt;

/// Registry key for a handler: namespace plus handler name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId {
    /// Namespace the handler lives in.
    pub namespace: String,
    /// Handler name within the namespace.
    pub name: String,
}

impl HandlerId {
    /// Create a handler id.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)
    }
}

/// The raw value a handler action produces.
///
/// A [`Response`] passes straight to filtering; anything else goes through
/// the VIEW stage, where a subscriber may convert it. A raw value that no
/// subscriber converts is a programming error in application code.
#[derive(Debug)]
pub enum ControllerOutput {
    /// A ready response.
    Response(Response),
    /// An arbitrary value that still needs conversion.
    Value(Value),
    /// The action produced nothing at all.
    None,
}

/// Arguments bound for one invocation, in declaration order.
#[derive(Debug, Default)]
pub struct Arguments {
    values: Vec<(String, Value)>,
}

impl Arguments {
    /// Build from already-bound pairs.
    pub fn from_pairs(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    /// A bound value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// A bound value by name, as a string slice if it is one.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Number of bound arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over bound `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// Application code the kernel dispatches to.
///
/// Registered in the handler registry under a [`HandlerId`]; one handler may
/// expose several actions. An unknown action should be reported as an
/// [`InvocationError::ActionNotFound`](crate::InvocationError::ActionNotFound)
/// so the kernel keeps the error kind.
pub trait Handler: Send + Sync {
    /// Run one action with its bound arguments.
    fn call(
        &self,
        action: &str,
        args: &Arguments,
        request: &Request,
    ) -> Result<ControllerOutput, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arguments_preserve_declaration_order() {
        let args =
            Arguments::from_pairs(vec![("b".into(), json!(2)), ("a".into(), json!("one"))]);
        let names: Vec<&str> = args.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(args.get_str("a"), Some("one"));
        assert_eq!(args.get("missing"), None);
    }
}
