//! Error types for the request lifecycle.
//!
//! Structured with `thiserror`:
//!
//! - [`KernelError`] - everything a request cycle can fail with
//! - [`InvocationError`] - contract violations around handler dispatch
//!
//! Startup-only errors (configuration, discovery) live in the runtime crate;
//! they are raised before the exception pipeline exists and are therefore
//! never recoverable through it.

use crate::handler::HandlerId;
use crate::request::Method;
use crate::route::ControllerRef;
use thiserror::Error;

/// A boxed error type for subscriber and handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error for one request cycle.
///
/// Every kind funnels through the single EXCEPTION event, where a subscriber
/// may downgrade it to a response or replace it with a different error. An
/// unrecovered error reaches the transport boundary as an error, not a
/// response; mapping it to a generic 500 is the surrounding system's job.
#[derive(Error, Debug)]
pub enum KernelError {
    /// No route matched the request's method and path.
    #[error("no route found for {method} {path}")]
    Routing {
        /// The unmatched method.
        method: Method,
        /// The unmatched path.
        path: String,
    },

    /// Handler dispatch violated its contract.
    #[error("invocation error: {0}")]
    Invocation(#[from] InvocationError),

    /// Any other error raised by a handler or a subscriber.
    #[error(transparent)]
    Application(BoxError),
}

impl KernelError {
    /// Wrap an arbitrary application error.
    pub fn application(error: impl Into<BoxError>) -> Self {
        KernelError::Application(error.into())
    }
}

/// Contract violations around handler dispatch. Always fatal unless an
/// EXCEPTION subscriber intervenes; never retried.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// No handler is registered under the route's target id.
    #[error("handler {0} is not registered")]
    HandlerNotFound(ControllerRef),

    /// The handler exists but has no such action.
    #[error("handler {handler} has no action `{action}`")]
    ActionNotFound {
        /// The handler that was asked.
        handler: HandlerId,
        /// The unknown action name.
        action: String,
    },

    /// A declared parameter could not be bound from the request.
    #[error("could not bind parameter `{name}` for {target}")]
    Binding {
        /// The action being invoked.
        target: ControllerRef,
        /// The parameter that had no value.
        name: String,
    },

    /// The action produced nothing and no view subscriber stepped in.
    #[error("{target} produced no result; a missing return value is likely")]
    MissingResult {
        /// The action that came back empty.
        target: ControllerRef,
    },

    /// The action returned a non-response value nobody converted.
    #[error("{target} returned a value that is not a response and no view subscriber converted it")]
    UnexpectedValue {
        /// The offending action.
        target: ControllerRef,
    },
}
