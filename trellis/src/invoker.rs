//! Handler registry and the dispatch-stage invoker.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use trellis_core::{
    Arguments, ControllerOutput, Handler, HandlerId, InvocationError, KernelError, MatchedRoute,
    Request,
};

/// Explicit registration table mapping handler ids to handler instances.
///
/// Populated by the embedding application at startup. The kernel never
/// constructs handlers by name or reflection; an id the table does not know
/// is an invocation error at dispatch time.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerId, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under an id.
    pub fn register(&mut self, id: HandlerId, handler: Arc<dyn Handler>) {
        self.handlers.insert(id, handler);
    }

    /// Register a handler, builder style.
    pub fn with(mut self, id: HandlerId, handler: Arc<dyn Handler>) -> Self {
        self.register(id, handler);
        self
    }

    /// Look up a handler.
    pub fn get(&self, id: &HandlerId) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(id)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Thin adapter between a matched route and application code.
///
/// Looks the target handler up, binds the route's declared parameters (path
/// captures first, then request parameters) and executes the action,
/// returning whatever raw value it produced.
pub struct Invoker {
    registry: HandlerRegistry,
}

impl Invoker {
    /// Create an invoker over a registry.
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Invoke the matched route's target for one request.
    pub fn invoke(
        &self,
        matched: &MatchedRoute,
        request: &Request,
    ) -> Result<ControllerOutput, KernelError> {
        let target = &matched.route.target;
        let handler = self
            .registry
            .get(&target.handler_id())
            .ok_or_else(|| InvocationError::HandlerNotFound(target.clone()))?;
        let args = bind(matched, request)?;
        tracing::debug!(target = %target, args = args.len(), "invoking handler");
        handler
            .call(&target.action, &args, request)
            .map_err(|error| match error.downcast::<InvocationError>() {
                Ok(invocation) => KernelError::Invocation(*invocation),
                Err(other) => KernelError::Application(other),
            })
    }
}

/// Bind the route's declared parameter names, path captures winning over
/// request parameters.
fn bind(matched: &MatchedRoute, request: &Request) -> Result<Arguments, InvocationError> {
    let mut values = Vec::with_capacity(matched.route.params.len());
    for name in &matched.route.params {
        let value = matched
            .params
            .get(name)
            .map(|captured| Value::String(captured.clone()))
            .or_else(|| request.param(name).cloned())
            .ok_or_else(|| InvocationError::Binding {
                target: matched.route.target.clone(),
                name: name.clone(),
            })?;
        values.push((name.clone(), value));
    }
    Ok(Arguments::from_pairs(values))
}
