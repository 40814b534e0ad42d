//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trellis::{
    AnnotationReader, Arguments, BoxError, ControllerOutput, Event, Handler, HandlerId,
    HandlerRegistry, InvocationError, Kernel, KernelBuilder, KernelConfig, Method, Request,
    Response, RouteDecl, Subscriber, SubscriberRegistry, Topic, Transport,
};

/// Records every topic that fires, in order.
pub struct TopicRecorder {
    pub seen: Arc<Mutex<Vec<Topic>>>,
}

impl Subscriber for TopicRecorder {
    fn topics(&self) -> Vec<Topic> {
        vec![
            Topic::Request,
            Topic::View,
            Topic::Response,
            Topic::Exception,
            Topic::Finish,
        ]
    }

    fn on_event(&self, event: &mut Event<'_, '_>) -> Result<(), BoxError> {
        self.seen.lock().unwrap().push(event.topic());
        Ok(())
    }
}

/// Annotation reader backed by a fixed handler-name -> declarations map.
pub struct StubReader {
    pub calls: Arc<AtomicUsize>,
    pub routes: HashMap<String, Vec<RouteDecl>>,
}

impl AnnotationReader for StubReader {
    fn routes_for(&self, handler: &HandlerId) -> Result<Vec<RouteDecl>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.routes.get(&handler.name).cloned().unwrap_or_default())
    }
}

/// The one test handler, exposing an action per scenario.
pub struct EchoHandler {
    pub calls: Arc<AtomicUsize>,
}

impl Handler for EchoHandler {
    fn call(
        &self,
        action: &str,
        args: &Arguments,
        request: &Request,
    ) -> Result<ControllerOutput, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match action {
            "echo" => Ok(ControllerOutput::Response(Response::ok(
                args.get_str("name").unwrap_or("").to_string(),
            ))),
            "probe" => Ok(ControllerOutput::Response(Response::ok(
                request
                    .param("name")
                    .and_then(Value::as_str)
                    .unwrap_or("missing")
                    .to_string(),
            ))),
            "value" => Ok(ControllerOutput::Value(json!({ "answer": 42 }))),
            "nothing" => Ok(ControllerOutput::None),
            "fail" => Err("handler exploded".into()),
            other => Err(Box::new(InvocationError::ActionNotFound {
                handler: HandlerId::new("app", "users"),
                action: other.to_string(),
            })),
        }
    }
}

/// Captures every response `handle` sends.
#[derive(Default)]
pub struct CapturingTransport {
    pub sent: Mutex<Vec<Response>>,
}

impl Transport for CapturingTransport {
    fn send(&self, response: &Response) -> Result<(), BoxError> {
        self.sent.lock().unwrap().push(response.clone());
        Ok(())
    }
}

fn decl(method: Method, path: &str, action: &str, params: &[&str]) -> RouteDecl {
    RouteDecl {
        method,
        path: path.to_string(),
        action: action.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
    }
}

/// The default declarations for the `users` handler.
pub fn default_routes() -> HashMap<String, Vec<RouteDecl>> {
    HashMap::from([(
        "users".to_string(),
        vec![
            decl(Method::Get, "/echo/{name}", "echo", &["name"]),
            decl(Method::Post, "/users", "echo", &["name"]),
            decl(Method::Get, "/probe", "probe", &[]),
            decl(Method::Get, "/value", "value", &[]),
            decl(Method::Get, "/nothing", "nothing", &[]),
            decl(Method::Get, "/boom", "fail", &[]),
        ],
    )])
}

/// Handler and cache directories for one test, plus the observable counters
/// a kernel built from them reports into.
pub struct TestBed {
    pub handler_dir: tempfile::TempDir,
    pub cache_dir: tempfile::TempDir,
}

pub struct BuiltParts {
    pub builder: KernelBuilder,
    pub reader_calls: Arc<AtomicUsize>,
    pub handler_calls: Arc<AtomicUsize>,
    pub topics: Arc<Mutex<Vec<Topic>>>,
}

impl TestBed {
    pub fn new() -> Self {
        let handler_dir = tempfile::tempdir().unwrap();
        std::fs::write(handler_dir.path().join("users.rs"), "").unwrap();
        Self {
            handler_dir,
            cache_dir: tempfile::tempdir().unwrap(),
        }
    }

    /// A builder wired with the default routes.
    pub fn parts(&self, debug: bool) -> BuiltParts {
        self.parts_with_routes(debug, default_routes())
    }

    /// A builder wired with custom route declarations.
    pub fn parts_with_routes(
        &self,
        debug: bool,
        routes: HashMap<String, Vec<RouteDecl>>,
    ) -> BuiltParts {
        let reader_calls = Arc::new(AtomicUsize::new(0));
        let handler_calls = Arc::new(AtomicUsize::new(0));
        let topics = Arc::new(Mutex::new(Vec::new()));

        let recorder = Arc::new(TopicRecorder {
            seen: topics.clone(),
        });
        let subscriber_registry = SubscriberRegistry::new().with("recorder", move || {
            recorder.clone() as Arc<dyn Subscriber>
        });

        let mut config = KernelConfig::new(BTreeMap::from([(
            "app".to_string(),
            self.handler_dir.path().to_path_buf(),
        )]));
        config.debug = debug;
        config.cache_directory = self.cache_dir.path().to_path_buf();
        config.subscribers = vec!["recorder".to_string()];

        let handlers = HandlerRegistry::new().with(
            HandlerId::new("app", "users"),
            Arc::new(EchoHandler {
                calls: handler_calls.clone(),
            }),
        );

        let builder = Kernel::builder(config)
            .annotation_reader(Arc::new(StubReader {
                calls: reader_calls.clone(),
                routes,
            }))
            .handlers(handlers)
            .subscriber_registry(subscriber_registry);

        BuiltParts {
            builder,
            reader_calls,
            handler_calls,
            topics,
        }
    }
}

/// Count how often `topic` appears in the recorded sequence.
pub fn count_topic(topics: &Arc<Mutex<Vec<Topic>>>, topic: Topic) -> usize {
    topics.lock().unwrap().iter().filter(|t| **t == topic).count()
}
