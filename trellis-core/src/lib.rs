//! # trellis-core
//!
//! Core contracts for the Trellis request lifecycle kernel.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! subscribers, handlers and integrations that don't need the full `trellis`
//! runtime.
//!
//! # Lifecycle
//!
//! Trellis converts one incoming request into exactly one response by running
//! a fixed sequence of extension points. Each point publishes a typed event to
//! an ordered list of subscribers:
//!
//! 1. **REQUEST** ([`RequestEvent`]) — a subscriber may supply an early
//!    response, skipping routing and dispatch entirely.
//! 2. **ROUTE** — the request's method and path are matched against the route
//!    table; no match is a [`KernelError::Routing`].
//! 3. **DISPATCH** — the matched handler runs and produces a raw
//!    [`ControllerOutput`].
//! 4. **VIEW** ([`ControllerResultEvent`]) — fires only when the raw output is
//!    not already a response; a subscriber may convert it.
//! 5. **RESPONSE** ([`ResponseEvent`]) — subscribers may replace the response
//!    before it is finalized.
//! 6. **FINISH** ([`FinishEvent`]) — terminal and informational.
//!
//! Any failure in stages 1-5 diverts once into **EXCEPTION**
//! ([`ExceptionEvent`]), where a subscriber may recover with a response or
//! replace the error.
//!
//! # Seams
//!
//! The kernel deliberately does not own its collaborators. Route metadata
//! extraction is behind [`AnnotationReader`], the transport behind
//! [`Transport`], identity behind [`UserProvider`], and application code
//! behind [`Handler`]. All of them are injected explicitly; there is no
//! ambient lookup.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod event;
mod handler;
mod provider;
mod request;
mod response;
mod route;
mod subscriber;
mod transport;

// Re-exports
pub use error::{BoxError, InvocationError, KernelError};
pub use event::{
    ControllerResultEvent, Event, ExceptionEvent, FinishEvent, RequestEvent, ResponseEvent, Topic,
};
pub use handler::{Arguments, ControllerOutput, Handler, HandlerId};
pub use provider::UserProvider;
pub use request::{Method, Request};
pub use response::Response;
pub use route::{AnnotationReader, ControllerRef, MatchedRoute, Route, RouteDecl};
pub use subscriber::{FnSubscriber, Subscriber, subscriber_fn};
pub use transport::Transport;
