//! Subscriber contract for the event bus.

use crate::error::BoxError;
use crate::event::{Event, Topic};

/// A lifecycle extension point.
///
/// A subscriber declares which topics it wants and observes (or mutates) the
/// event it is handed. Invocation order on a topic is registration order.
///
/// Errors returned here are not caught by the bus; propagation is the
/// kernel's responsibility. Subscribers on the [`Topic::Exception`] and
/// [`Topic::Finish`] topics are expected not to fail: if they do, the error
/// propagates to the kernel's caller with no further recovery attempt.
pub trait Subscriber: Send + Sync {
    /// Topics this subscriber observes.
    fn topics(&self) -> Vec<Topic>;

    /// Observe one event. The reference is exclusive for the duration of the
    /// publish call only.
    fn on_event(&self, event: &mut Event<'_, '_>) -> Result<(), BoxError>;
}

/// A subscriber built from a closure.
///
/// Handy for tests and small embedders; construct via [`subscriber_fn`].
pub struct FnSubscriber<F> {
    topics: Vec<Topic>,
    func: F,
}

impl<F> Subscriber for FnSubscriber<F>
where
    F: Fn(&mut Event<'_, '_>) -> Result<(), BoxError> + Send + Sync,
{
    fn topics(&self) -> Vec<Topic> {
        self.topics.clone()
    }

    fn on_event(&self, event: &mut Event<'_, '_>) -> Result<(), BoxError> {
        (self.func)(event)
    }
}

/// Wrap a closure as a [`Subscriber`] for the given topics.
pub fn subscriber_fn<F>(topics: Vec<Topic>, func: F) -> FnSubscriber<F>
where
    F: Fn(&mut Event<'_, '_>) -> Result<(), BoxError> + Send + Sync,
{
    FnSubscriber { topics, func }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Method, Request};
    use crate::response::Response;
    use crate::event::RequestEvent;

    #[test]
    fn fn_subscriber_mutates_the_event() {
        let subscriber = subscriber_fn(vec![Topic::Request], |event| {
            if let Event::Request(ev) = event {
                ev.set_response(Response::ok("short-circuit"));
            }
            Ok(())
        });
        assert_eq!(subscriber.topics(), vec![Topic::Request]);

        let request = Request::new(Method::Get, "/");
        let mut ev = RequestEvent::new(&request);
        subscriber.on_event(&mut Event::Request(&mut ev)).unwrap();
        assert!(ev.has_response());
    }
}
