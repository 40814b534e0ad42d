//! Route metadata and the annotation-extraction seam.

use crate::error::BoxError;
use crate::handler::HandlerId;
use crate::request::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The target of a route: which action on which handler in which namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerRef {
    /// Namespace the handler was discovered under.
    pub namespace: String,
    /// Handler name within the namespace.
    pub handler: String,
    /// Action name on the handler.
    pub action: String,
}

impl ControllerRef {
    /// Create a controller reference.
    pub fn new(
        namespace: impl Into<String>,
        handler: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            handler: handler.into(),
            action: action.into(),
        }
    }

    /// The registry key identifying the handler this reference points at.
    pub fn handler_id(&self) -> HandlerId {
        HandlerId::new(self.namespace.clone(), self.handler.clone())
    }
}

impl fmt::Display for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.namespace, self.handler, self.action)
    }
}

/// A single entry in the route table.
///
/// Built once per discovery pass (or loaded from the cache) and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// HTTP method this route answers to.
    pub method: Method,
    /// Path pattern, `{param}` segments bind path parameters.
    pub path: String,
    /// The handler action this route dispatches to.
    pub target: ControllerRef,
    /// Parameter names the action expects, in declaration order.
    pub params: Vec<String>,
}

/// A [`Route`] bound to concrete parameter values for one specific request.
///
/// Created per request, discarded after dispatch.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    /// The matched route.
    pub route: Route,
    /// Parameter values captured from the request path.
    pub params: HashMap<String, String>,
}

/// One route declaration as extracted from handler code.
///
/// Namespace and handler name are supplied by the discovery pass; the reader
/// only reports what the handler itself declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecl {
    /// HTTP method.
    pub method: Method,
    /// Path pattern.
    pub path: String,
    /// Action name on the declaring handler.
    pub action: String,
    /// Declared parameter names.
    pub params: Vec<String>,
}

/// The annotation/reflection seam.
///
/// Extracting declared routes from handler code is an external capability:
/// given a handler's identity, return its declared routes. The kernel never
/// reimplements reflection; discovery asks this collaborator instead.
pub trait AnnotationReader: Send + Sync {
    /// Declared routes for one handler.
    fn routes_for(&self, handler: &HandlerId) -> Result<Vec<RouteDecl>, BoxError>;
}
