//! Templated REST client core.
//!
//! # Overview
//! Turns a method, a path template such as `/api/users/{id}`, path bindings,
//! data and headers into an absolute URL and an `HttpRequest`, performs it
//! through a `Transport`, and routes the parsed JSON response to one of three
//! caller-supplied handlers: success, failure or error. A handler may return a
//! typed `Event`, which is forwarded to an optional `StateSink`.
//!
//! # Design
//! - `RestClient` holds an immutable `ClientConfig`; create one per target
//!   server and reuse it.
//! - `Endpoint` describes a call shape once. `Endpoint::bind` yields a
//!   `CallRequest` and `RestClient::call` performs it with `Handlers`.
//! - Request building is pure (`build_request`); only the `Transport` does I/O.
//! - Header precedence: call-level over endpoint-level over client defaults.
//! - There is no retry, caching or timeout. A call completes exactly once
//!   through exactly one handler.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;
pub mod url;

pub use client::{CallRequest, RestClient};
pub use config::{CacheMode, ClientConfig, FetchOptions, RedirectPolicy};
pub use dispatch::{Dispatch, Event, Handlers, Outcome, StateSink};
pub use endpoint::Endpoint;
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{headers, merge_headers, set_header, Headers, Params};
