//! Event bus: ordered, sequential delivery per topic.

use std::collections::HashMap;
use std::sync::Arc;
use trellis_core::{BoxError, Event, Subscriber, Topic};

/// Publishes lifecycle events to registered subscribers.
///
/// Subscribers are invoked in registration order. The bus does not catch
/// subscriber errors: the first failure aborts the publish and propagates to
/// the caller (the kernel owns recovery). The registry is assembled once at
/// startup and never mutated during request handling, so concurrent reads
/// need no synchronization.
#[derive(Default)]
pub struct EventBus {
    topics: HashMap<Topic, Vec<Arc<dyn Subscriber>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber on a single topic.
    pub fn subscribe(&mut self, topic: Topic, subscriber: Arc<dyn Subscriber>) {
        self.topics.entry(topic).or_default().push(subscriber);
    }

    /// Register a subscriber on every topic it declares.
    pub fn register(&mut self, subscriber: Arc<dyn Subscriber>) {
        for topic in subscriber.topics() {
            self.subscribe(topic, subscriber.clone());
        }
    }

    /// Number of subscribers on a topic.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics.get(&topic).map_or(0, Vec::len)
    }

    /// Publish an event to every subscriber of `topic`, in registration
    /// order. Subscribers mutate the event in place through the exclusive
    /// reference; the first error aborts the publish.
    pub fn publish(&self, topic: Topic, mut event: Event<'_, '_>) -> Result<(), BoxError> {
        let Some(subscribers) = self.topics.get(&topic) else {
            return Ok(());
        };
        tracing::trace!(topic = %topic, subscribers = subscribers.len(), "publishing event");
        for subscriber in subscribers {
            subscriber.on_event(&mut event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use trellis_core::{subscriber_fn, FinishEvent, Method, Request};

    fn recording(
        id: usize,
        order: Arc<Mutex<Vec<usize>>>,
    ) -> Arc<dyn Subscriber> {
        Arc::new(subscriber_fn(vec![Topic::Finish], move |_event| {
            order.lock().unwrap().push(id);
            Ok(())
        }))
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(Topic::Finish, recording(1, order.clone()));
        bus.subscribe(Topic::Finish, recording(2, order.clone()));
        bus.subscribe(Topic::Finish, recording(3, order.clone()));

        let request = Request::new(Method::Get, "/");
        let mut ev = FinishEvent::new(&request);
        bus.publish(Topic::Finish, Event::Finish(&mut ev)).unwrap();

        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn first_error_aborts_the_publish() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(Topic::Finish, recording(1, order.clone()));
        bus.subscribe(
            Topic::Finish,
            Arc::new(subscriber_fn(vec![Topic::Finish], |_event| {
                Err("boom".into())
            })),
        );
        bus.subscribe(Topic::Finish, recording(3, order.clone()));

        let request = Request::new(Method::Get, "/");
        let mut ev = FinishEvent::new(&request);
        let result = bus.publish(Topic::Finish, Event::Finish(&mut ev));

        assert!(result.is_err());
        assert_eq!(*order.lock().unwrap(), vec![1], "third subscriber must not run");
    }

    #[test]
    fn publishing_to_an_empty_topic_is_a_no_op() {
        let bus = EventBus::new();
        let request = Request::new(Method::Get, "/");
        let mut ev = FinishEvent::new(&request);
        assert!(bus.publish(Topic::Finish, Event::Finish(&mut ev)).is_ok());
    }

    #[test]
    fn register_covers_every_declared_topic() {
        let mut bus = EventBus::new();
        bus.register(Arc::new(subscriber_fn(
            vec![Topic::Request, Topic::Response],
            |_event| Ok(()),
        )));
        assert_eq!(bus.subscriber_count(Topic::Request), 1);
        assert_eq!(bus.subscriber_count(Topic::Response), 1);
        assert_eq!(bus.subscriber_count(Topic::Finish), 0);
    }
}
