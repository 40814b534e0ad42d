//! # Trellis
//!
//! The request-handling kernel of a small web runtime: one incoming request
//! becomes exactly one response by running a fixed sequence of extension
//! points, resolving the target handler through a discoverable routing table,
//! invoking it, and normalizing whatever it returns.
//!
//! This crate is the runtime; the contracts (events, subscriber and handler
//! traits, errors) live in [`trellis_core`] and are re-exported here.
//!
//! # Quick tour
//!
//! ```rust,ignore
//! let config = KernelConfig::from_path(Path::new("trellis.toml"))?;
//! let kernel = Kernel::builder(config)
//!     .annotation_reader(reader)
//!     .handlers(handlers)
//!     .subscriber_registry(subscribers)
//!     .transport(transport)
//!     .build()?;
//!
//! kernel.handle(request)?; // exactly one response reaches the transport
//! ```

mod bus;
mod config;
mod invoker;
mod kernel;
pub mod routing;

pub use bus::EventBus;
pub use config::{ConfigError, KernelConfig, ProviderRegistry, SubscriberRegistry};
pub use invoker::{HandlerRegistry, Invoker};
pub use kernel::{DiscardTransport, Kernel, KernelBuilder, StartupError};
pub use routing::{DiscoveryError, RouteDiscovery, RouteInsertError, RouteTable};

// Contract re-exports so embedders depend on one crate.
pub use trellis_core::{
    AnnotationReader, Arguments, BoxError, ControllerOutput, ControllerResultEvent, ControllerRef,
    Event, ExceptionEvent, FinishEvent, FnSubscriber, Handler, HandlerId, InvocationError,
    KernelError, MatchedRoute, Method, Request, RequestEvent, Response, ResponseEvent, Route,
    RouteDecl, Subscriber, Topic, Transport, UserProvider, subscriber_fn,
};
