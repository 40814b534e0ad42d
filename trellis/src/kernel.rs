//! The request lifecycle kernel.

use crate::bus::EventBus;
use crate::config::{ConfigError, KernelConfig, ProviderRegistry, SubscriberRegistry};
use crate::invoker::{HandlerRegistry, Invoker};
use crate::routing::{DiscoveryError, RouteDiscovery, RouteTable};
use std::sync::Arc;
use thiserror::Error;
use trellis_core::{
    AnnotationReader, BoxError, ControllerOutput, ControllerResultEvent, Event, ExceptionEvent,
    FinishEvent, InvocationError, KernelError, MatchedRoute, Request, RequestEvent, Response,
    ResponseEvent, Subscriber, Topic, Transport, UserProvider,
};

/// Failures while constructing a [`Kernel`]. Raised before any request is
/// processed; never routed through the exception pipeline.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Route discovery failed.
    #[error("route discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
}

/// A transport that drops the response.
///
/// The builder's default, for embeddings that only call
/// [`Kernel::process_request`] (tests, offline tooling).
#[derive(Debug, Default)]
pub struct DiscardTransport;

impl Transport for DiscardTransport {
    fn send(&self, _response: &Response) -> Result<(), BoxError> {
        Ok(())
    }
}

/// The request lifecycle kernel.
///
/// One logical, synchronous, single-threaded pass through the state machine
/// per request; no internal concurrency. Concurrent invocations are
/// independent: the bus registry and route table are assembled once at
/// startup and only read afterwards.
pub struct Kernel {
    bus: EventBus,
    invoker: Invoker,
    routes: RouteTable,
    transport: Arc<dyn Transport>,
    user_provider: Option<Arc<dyn UserProvider>>,
}

impl Kernel {
    /// Start building a kernel from configuration.
    pub fn builder(config: KernelConfig) -> KernelBuilder {
        KernelBuilder::new(config)
    }

    /// The identity service, if configuration named a provider factory.
    pub fn user_provider(&self) -> Option<&Arc<dyn UserProvider>> {
        self.user_provider.as_ref()
    }

    /// Convert a request into a response and send it through the transport.
    ///
    /// Sends exactly one response, exactly once, per call. An error not
    /// converted to a response by an EXCEPTION subscriber propagates to the
    /// caller unchanged and nothing is sent — mapping it into a generic
    /// error response is the surrounding system's job.
    pub fn handle(&self, request: Request) -> Result<(), KernelError> {
        let response = self.process_request(request)?;
        self.transport
            .send(&response)
            .map_err(KernelError::Application)
    }

    /// Convert a request into a response, with no transport side effect.
    ///
    /// The full state machine: body normalization, REQUEST, routing,
    /// dispatch, VIEW, RESPONSE filtering and FINISH, with a single
    /// exception-handling cycle on failure. One deliberate quirk is kept
    /// from the lifecycle contract: when an EXCEPTION subscriber supplies a
    /// recovery response and filtering that response then fails, the
    /// filtering failure is discarded and the unfiltered response returned —
    /// the kernel never loses a recovery response trying to decorate it.
    /// The swallow is logged at `warn` level.
    pub fn process_request(&self, mut request: Request) -> Result<Response, KernelError> {
        request.merge_json_body();
        match self.run(&request) {
            Ok(response) => Ok(response),
            Err(error) => self.recover(&request, error),
        }
    }

    /// Stages 2-6 of the state machine; any error diverts to [`Self::recover`].
    fn run(&self, request: &Request) -> Result<Response, KernelError> {
        tracing::debug!(method = %request.method(), path = request.path(), "handling request");

        // REQUEST stage: a subscriber may short-circuit the whole pipeline.
        let mut event = RequestEvent::new(request);
        self.bus
            .publish(Topic::Request, Event::Request(&mut event))
            .map_err(KernelError::Application)?;
        if let Some(response) = event.take_response() {
            tracing::debug!("request subscriber supplied an early response");
            return self.filter(request, response);
        }

        // ROUTE stage.
        let matched = self
            .routes
            .lookup(request.method(), request.path())
            .ok_or_else(|| KernelError::Routing {
                method: request.method().clone(),
                path: request.path().to_string(),
            })?;

        // DISPATCH stage.
        let raw = self.invoker.invoke(&matched, request)?;
        let response = match raw {
            ControllerOutput::Response(response) => response,
            other => self.view(request, &matched, other)?,
        };

        self.filter(request, response)
    }

    /// VIEW stage: give subscribers a chance to convert a raw result. A raw
    /// value nobody converts is a programming error in application code,
    /// always fatal, never retried.
    fn view(
        &self,
        request: &Request,
        matched: &MatchedRoute,
        raw: ControllerOutput,
    ) -> Result<Response, KernelError> {
        let produced_nothing = matches!(raw, ControllerOutput::None);
        let mut event = ControllerResultEvent::new(request, raw);
        self.bus
            .publish(Topic::View, Event::ControllerResult(&mut event))
            .map_err(KernelError::Application)?;
        match event.take_response() {
            Some(response) => Ok(response),
            None if produced_nothing => Err(InvocationError::MissingResult {
                target: matched.route.target.clone(),
            }
            .into()),
            None => Err(InvocationError::UnexpectedValue {
                target: matched.route.target.clone(),
            }
            .into()),
        }
    }

    /// Filtering: publish the RESPONSE event and finish the request. The
    /// replacement response, if any, wins.
    fn filter(&self, request: &Request, response: Response) -> Result<Response, KernelError> {
        let mut event = ResponseEvent::new(request, response);
        self.bus
            .publish(Topic::Response, Event::Response(&mut event))
            .map_err(KernelError::Application)?;
        let response = event.into_response();
        self.finish(request)?;
        Ok(response)
    }

    /// FINISH stage. Purely observational; subscribers here are expected not
    /// to fail, and if one does the error propagates unmodified.
    fn finish(&self, request: &Request) -> Result<(), KernelError> {
        let mut event = FinishEvent::new(request);
        self.bus
            .publish(Topic::Finish, Event::Finish(&mut event))
            .map_err(KernelError::Application)
    }

    /// The single exception-handling cycle. A subscriber may resolve the
    /// failure with a response or replace the error; an unrecovered error is
    /// re-raised after FINISH bookkeeping.
    fn recover(&self, request: &Request, error: KernelError) -> Result<Response, KernelError> {
        tracing::debug!(%error, "request failed, entering exception stage");

        let mut event = ExceptionEvent::new(request, error);
        self.bus
            .publish(Topic::Exception, Event::Exception(&mut event))
            .map_err(KernelError::Application)?;

        // A subscriber may have replaced the error; re-read it.
        let (error, recovery) = event.into_parts();
        match recovery {
            None => {
                self.finish(request)?;
                Err(error)
            }
            Some(response) => {
                let unfiltered = response.clone();
                match self.filter(request, response) {
                    Ok(filtered) => Ok(filtered),
                    Err(filter_error) => {
                        tracing::warn!(
                            %filter_error,
                            "filtering failed during exception recovery; returning the unfiltered response"
                        );
                        Ok(unfiltered)
                    }
                }
            }
        }
    }
}

/// Builds a [`Kernel`] from explicit, explicitly-constructed dependencies.
///
/// Validation and route discovery run in `build()`, so misconfiguration
/// surfaces before any request is processed, and the route table is complete
/// (never partially populated) by the time the kernel is shared across
/// threads.
pub struct KernelBuilder {
    config: KernelConfig,
    reader: Option<Arc<dyn AnnotationReader>>,
    subscriber_registry: SubscriberRegistry,
    provider_registry: ProviderRegistry,
    handlers: HandlerRegistry,
    transport: Arc<dyn Transport>,
    direct_subscribers: Vec<(Topic, Arc<dyn Subscriber>)>,
}

impl KernelBuilder {
    /// Start from configuration.
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            reader: None,
            subscriber_registry: SubscriberRegistry::new(),
            provider_registry: ProviderRegistry::new(),
            handlers: HandlerRegistry::new(),
            transport: Arc::new(DiscardTransport),
            direct_subscribers: Vec::new(),
        }
    }

    /// Inject the annotation/reflection collaborator. Required.
    pub fn annotation_reader(mut self, reader: Arc<dyn AnnotationReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Supply the handler registration table.
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Supply the subscriber factory table configuration keys resolve against.
    pub fn subscriber_registry(mut self, registry: SubscriberRegistry) -> Self {
        self.subscriber_registry = registry;
        self
    }

    /// Supply the provider factory table the `user_provider` key resolves
    /// against.
    pub fn provider_registry(mut self, registry: ProviderRegistry) -> Self {
        self.provider_registry = registry;
        self
    }

    /// Register a subscriber directly on one topic, bypassing configuration.
    /// Direct subscribers run after configured ones, in registration order.
    pub fn subscribe(mut self, topic: Topic, subscriber: Arc<dyn Subscriber>) -> Self {
        self.direct_subscribers.push((topic, subscriber));
        self
    }

    /// Inject the transport `handle` sends responses through.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Validate configuration, assemble the bus, construct the identity
    /// service and run route discovery for every configured mapping.
    pub fn build(self) -> Result<Kernel, StartupError> {
        self.config.validate().map_err(StartupError::Config)?;

        let mut bus = EventBus::new();
        for key in &self.config.subscribers {
            let subscriber = self
                .subscriber_registry
                .resolve(key)
                .ok_or_else(|| ConfigError::UnknownSubscriber(key.clone()))?;
            bus.register(subscriber);
        }
        for (topic, subscriber) in self.direct_subscribers {
            bus.subscribe(topic, subscriber);
        }

        let user_provider = match &self.config.user_provider {
            Some(key) => Some(
                self.provider_registry
                    .resolve(key)
                    .ok_or_else(|| ConfigError::UnknownProvider(key.clone()))?,
            ),
            None => None,
        };

        let reader = self.reader.ok_or(ConfigError::MissingAnnotationReader)?;
        let discovery = RouteDiscovery::new(
            reader,
            self.config.debug,
            self.config.cache_directory.clone(),
        );
        let mut routes = RouteTable::new();
        for (namespace, directory) in &self.config.route_discovery {
            for route in discovery.discover(namespace, directory)? {
                routes.insert(route).map_err(DiscoveryError::from)?;
            }
        }
        tracing::info!(routes = routes.len(), "kernel ready");

        Ok(Kernel {
            bus,
            invoker: Invoker::new(self.handlers),
            routes,
            transport: self.transport,
            user_provider,
        })
    }
}
