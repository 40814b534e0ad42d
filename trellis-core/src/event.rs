//! Lifecycle events and topics.
//!
//! Each lifecycle stage has its own event struct with exactly the mutable
//! fields its subscribers are allowed to touch. The kernel owns the event for
//! the whole publish; subscribers receive it through [`Event`], an enum of
//! exclusive references that lives only for the duration of a single publish
//! call.

use crate::error::KernelError;
use crate::handler::ControllerOutput;
use crate::request::Request;
use crate::response::Response;
use std::fmt;

/// A named point in the lifecycle at which subscribers are invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Before routing; a subscriber may supply an early response.
    Request,
    /// After dispatch, when the raw result is not yet a response.
    View,
    /// Response filtering, just before the response is finalized.
    Response,
    /// A failure was caught; a subscriber may recover or replace the error.
    Exception,
    /// Terminal bookkeeping; fires exactly once per request.
    Finish,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Topic::Request => "request",
            Topic::View => "view",
            Topic::Response => "response",
            Topic::Exception => "exception",
            Topic::Finish => "finish",
        })
    }
}

/// Published at the REQUEST stage. A subscriber that sets a response
/// short-circuits routing and dispatch entirely.
#[derive(Debug)]
pub struct RequestEvent<'r> {
    request: &'r Request,
    response: Option<Response>,
}

impl<'r> RequestEvent<'r> {
    /// Create an event for the given request.
    pub fn new(request: &'r Request) -> Self {
        Self {
            request,
            response: None,
        }
    }

    /// The originating request.
    pub fn request(&self) -> &Request {
        self.request
    }

    /// Whether a subscriber already supplied a response.
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// The early response, if any.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Supply (or replace) the early response.
    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Take the early response out, leaving the event empty.
    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }
}

/// Published at the VIEW stage, carrying the raw handler result. A subscriber
/// may convert it into a response; nothing else about the result is mutable.
#[derive(Debug)]
pub struct ControllerResultEvent<'r> {
    request: &'r Request,
    result: ControllerOutput,
    response: Option<Response>,
}

impl<'r> ControllerResultEvent<'r> {
    /// Create an event for the given raw result.
    pub fn new(request: &'r Request, result: ControllerOutput) -> Self {
        Self {
            request,
            result,
            response: None,
        }
    }

    /// The originating request.
    pub fn request(&self) -> &Request {
        self.request
    }

    /// The raw value the handler returned.
    pub fn result(&self) -> &ControllerOutput {
        &self.result
    }

    /// Whether a subscriber converted the result.
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Supply (or replace) the converted response.
    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Take the converted response out.
    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }
}

/// Published at the RESPONSE stage with a guaranteed response. A subscriber
/// may mutate or wholesale replace it; downstream stages use the replacement.
#[derive(Debug)]
pub struct ResponseEvent<'r> {
    request: &'r Request,
    response: Response,
}

impl<'r> ResponseEvent<'r> {
    /// Create an event for the given response.
    pub fn new(request: &'r Request, response: Response) -> Self {
        Self { request, response }
    }

    /// The originating request.
    pub fn request(&self) -> &Request {
        self.request
    }

    /// The current response.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// The current response, mutably.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Replace the response outright.
    pub fn set_response(&mut self, response: Response) {
        self.response = response;
    }

    /// Consume the event, yielding the final response.
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Published at the EXCEPTION stage. A subscriber may resolve the failure
/// with a response, or replace the error (redact, wrap, reclassify).
#[derive(Debug)]
pub struct ExceptionEvent<'r> {
    request: &'r Request,
    error: KernelError,
    response: Option<Response>,
}

impl<'r> ExceptionEvent<'r> {
    /// Create an event for the caught error.
    pub fn new(request: &'r Request, error: KernelError) -> Self {
        Self {
            request,
            error,
            response: None,
        }
    }

    /// The originating request.
    pub fn request(&self) -> &Request {
        self.request
    }

    /// The current error.
    pub fn error(&self) -> &KernelError {
        &self.error
    }

    /// Replace the error.
    pub fn set_error(&mut self, error: KernelError) {
        self.error = error;
    }

    /// Whether a subscriber supplied a recovery response.
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Supply (or replace) the recovery response.
    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Consume the event, yielding the (possibly replaced) error and the
    /// recovery response if one was supplied.
    pub fn into_parts(self) -> (KernelError, Option<Response>) {
        (self.error, self.response)
    }
}

/// Published at the FINISH stage. Purely observational; no mutation contract.
#[derive(Debug)]
pub struct FinishEvent<'r> {
    request: &'r Request,
}

impl<'r> FinishEvent<'r> {
    /// Create a finish event.
    pub fn new(request: &'r Request) -> Self {
        Self { request }
    }

    /// The originating request.
    pub fn request(&self) -> &Request {
        self.request
    }
}

/// The event a subscriber receives: one exclusive reference per stage,
/// valid only for the duration of a single publish call.
#[derive(Debug)]
pub enum Event<'a, 'r> {
    /// REQUEST stage.
    Request(&'a mut RequestEvent<'r>),
    /// VIEW stage.
    ControllerResult(&'a mut ControllerResultEvent<'r>),
    /// RESPONSE stage.
    Response(&'a mut ResponseEvent<'r>),
    /// EXCEPTION stage.
    Exception(&'a mut ExceptionEvent<'r>),
    /// FINISH stage.
    Finish(&'a mut FinishEvent<'r>),
}

impl Event<'_, '_> {
    /// The topic this event belongs to.
    pub fn topic(&self) -> Topic {
        match self {
            Event::Request(_) => Topic::Request,
            Event::ControllerResult(_) => Topic::View,
            Event::Response(_) => Topic::Response,
            Event::Exception(_) => Topic::Exception,
            Event::Finish(_) => Topic::Finish,
        }
    }

    /// The originating request, available on every variant.
    pub fn request(&self) -> &Request {
        match self {
            Event::Request(ev) => ev.request(),
            Event::ControllerResult(ev) => ev.request(),
            Event::Response(ev) => ev.request(),
            Event::Exception(ev) => ev.request(),
            Event::Finish(ev) => ev.request(),
        }
    }
}
