//! Outcome handlers and forwarding of typed events to a state sink.
//!
//! # Design
//! A handler either returns nothing interesting (`Dispatch::NoEvent`) or a
//! typed `Event`. Whether the event reaches the sink is decided by a match on
//! that result, never by probing its shape. Closures returning `()` convert
//! to `NoEvent`, so ordinary callbacks work unchanged.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// A typed state-update event, e.g. `{"type": "USER_CREATED", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// What a handler hands back after it runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dispatch {
    #[default]
    NoEvent,
    Event(Event),
}

impl From<()> for Dispatch {
    fn from(_: ()) -> Self {
        Dispatch::NoEvent
    }
}

impl From<Event> for Dispatch {
    fn from(event: Event) -> Self {
        Dispatch::Event(event)
    }
}

impl From<Option<Event>> for Dispatch {
    fn from(event: Option<Event>) -> Self {
        event.map_or(Dispatch::NoEvent, Dispatch::Event)
    }
}

/// Receiver of forwarded events, e.g. a store's dispatch function.
pub trait StateSink: Send + Sync {
    fn dispatch(&self, event: Event);
}

impl<F> StateSink for F
where
    F: Fn(Event) + Send + Sync,
{
    fn dispatch(&self, event: Event) {
        self(event)
    }
}

/// The three ways a call can end.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 2xx status with a JSON body.
    Success(Value, HttpResponse),
    /// Any other status with a JSON body.
    Failure(Value, HttpResponse),
    /// No response, or a body that is not JSON.
    Error(ApiError, Option<HttpResponse>),
}

impl Outcome {
    /// Classify a received response.
    pub fn from_response(response: HttpResponse) -> Self {
        match serde_json::from_str::<Value>(&response.body) {
            Ok(json) if response.is_success() => Outcome::Success(json, response),
            Ok(json) => Outcome::Failure(json, response),
            Err(e) => Outcome::Error(ApiError::Deserialization(e.to_string()), Some(response)),
        }
    }

    /// Classify the result of a transport round-trip.
    pub fn from_result(result: Result<HttpResponse, ApiError>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(err) => Outcome::Error(err, None),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(..) => "success",
            Outcome::Failure(..) => "failure",
            Outcome::Error(..) => "error",
        }
    }
}

type ResponseHandler = Box<dyn FnOnce(Value, &HttpResponse) -> Dispatch + Send>;
type ErrorHandler = Box<dyn FnOnce(ApiError, Option<&HttpResponse>) -> Dispatch + Send>;

/// Per-call outcome handlers and optional state sink. Unset handlers are
/// no-ops.
#[derive(Default)]
pub struct Handlers {
    sink: Option<Arc<dyn StateSink>>,
    on_success: Option<ResponseHandler>,
    on_failure: Option<ResponseHandler>,
    on_error: Option<ErrorHandler>,
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("sink", &self.sink.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(mut self, sink: Arc<dyn StateSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn on_success<F, R>(mut self, handler: F) -> Self
    where
        F: FnOnce(Value, &HttpResponse) -> R + Send + 'static,
        R: Into<Dispatch>,
    {
        self.on_success = Some(Box::new(move |json, response| handler(json, response).into()));
        self
    }

    pub fn on_failure<F, R>(mut self, handler: F) -> Self
    where
        F: FnOnce(Value, &HttpResponse) -> R + Send + 'static,
        R: Into<Dispatch>,
    {
        self.on_failure = Some(Box::new(move |json, response| handler(json, response).into()));
        self
    }

    pub fn on_error<F, R>(mut self, handler: F) -> Self
    where
        F: FnOnce(ApiError, Option<&HttpResponse>) -> R + Send + 'static,
        R: Into<Dispatch>,
    {
        self.on_error = Some(Box::new(move |err, response| handler(err, response).into()));
        self
    }

    /// Run the handler matching `outcome` and forward its event, if any, to
    /// the sink. Returns what the handler produced.
    pub fn complete(self, outcome: Outcome) -> Dispatch {
        let result = match outcome {
            Outcome::Success(json, response) => match self.on_success {
                Some(handler) => handler(json, &response),
                None => Dispatch::NoEvent,
            },
            Outcome::Failure(json, response) => match self.on_failure {
                Some(handler) => handler(json, &response),
                None => Dispatch::NoEvent,
            },
            Outcome::Error(err, response) => match self.on_error {
                Some(handler) => handler(err, response.as_ref()),
                None => Dispatch::NoEvent,
            },
        };
        if let (Some(sink), Dispatch::Event(event)) = (&self.sink, &result) {
            trace!(event = %event.kind, "forwarding event to state sink");
            sink.dispatch(event.clone());
        }
        result
    }
}
