//! Templated REST client: URL assembly, request building and outcome routing.
//!
//! # Design
//! `RestClient` holds an immutable `ClientConfig` and a `Transport`. A call is
//! split the same way every time: `build_request` turns a `CallRequest` into
//! an `HttpRequest` without touching the network, the transport executes it,
//! `Outcome::from_result` classifies what came back, and `Handlers::complete`
//! runs the matching handler. `call` never returns an error; every failure is
//! delivered to the error handler exactly once.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::dispatch::{Handlers, Outcome};
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{Transport, UreqTransport};
use crate::types::{merge_headers, set_header, Headers, Params};
use crate::url;

/// One call: a path template with its bindings, data and call-level headers.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub method: HttpMethod,
    pub path: String,
    pub path_params: Params,
    pub data: Params,
    pub headers: Headers,
}

impl CallRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: Params::new(),
            data: Params::new(),
            headers: Headers::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, path)
    }

    pub fn path_params(mut self, path_params: Params) -> Self {
        self.path_params = path_params;
        self
    }

    pub fn data(mut self, data: Params) -> Self {
        self.data = data;
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }
}

/// Client bound to one target server.
#[derive(Clone)]
pub struct RestClient<T = UreqTransport> {
    config: Arc<ClientConfig>,
    transport: T,
}

impl<T> fmt::Debug for RestClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RestClient<UreqTransport> {
    /// Client using the ureq transport configured from `config.fetch`.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.fetch.redirect);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> RestClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Describe an endpoint once; bind and call it many times.
    pub fn endpoint(&self, method: HttpMethod, path_template: &str, base_headers: Headers) -> Endpoint {
        Endpoint::new(method, path_template, base_headers)
    }

    /// Absolute URL for `path` with `path_params` substituted and, when given,
    /// `query` appended.
    pub fn build_url(&self, path: &str, path_params: &Params, query: Option<&Params>) -> String {
        let mut path = url::interpolate(path, path_params);
        if let Some(query) = query {
            path = url::attach_query(&path, query);
        }
        url::compose(&self.config.scheme, &self.config.host, self.config.port, &path)
    }

    /// Build the `HttpRequest` for `request` without performing it.
    ///
    /// Mutating methods send `data` as a JSON body; all others send it as a
    /// query string. Call-level headers win over the client defaults.
    pub fn build_request(&self, request: &CallRequest) -> Result<HttpRequest, ApiError> {
        let in_body = request.method.carries_body();
        let query = (!in_body).then_some(&request.data);
        let url = self.build_url(&request.path, &request.path_params, query);
        let body = if in_body {
            let body = serde_json::to_string(&request.data)
                .map_err(|e| ApiError::Serialization(e.to_string()))?;
            Some(body)
        } else {
            None
        };
        let headers = merge_headers(&self.config.fetch.default_headers(), &request.headers)
            .into_iter()
            .collect();
        Ok(HttpRequest {
            method: request.method,
            url,
            headers,
            body,
        })
    }

    /// Perform `request` and route the result to `handlers`.
    pub async fn call(&self, request: CallRequest, handlers: Handlers) {
        let outcome = match self.build_request(&request) {
            Ok(http_request) => {
                let url = http_request.url.clone();
                debug!(method = %request.method, %url, "dispatching request");
                let outcome = Outcome::from_result(self.transport.execute(http_request).await);
                match &outcome {
                    Outcome::Error(err, response) => warn!(
                        method = %request.method,
                        %url,
                        status = response.as_ref().map(|r| r.status),
                        error = %err,
                        "request ended in error"
                    ),
                    other => debug!(
                        method = %request.method,
                        %url,
                        outcome = other.label(),
                        "request completed"
                    ),
                }
                outcome
            }
            Err(err) => {
                warn!(method = %request.method, path = %request.path, error = %err, "could not build request");
                Outcome::Error(err, None)
            }
        };
        handlers.complete(outcome);
    }

    /// Run `call` as a detached task on the current tokio runtime.
    pub fn spawn(&self, request: CallRequest, handlers: Handlers) -> JoinHandle<()>
    where
        T: Clone + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move { client.call(request, handlers).await })
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::dispatch::{Dispatch, Event, StateSink};
    use crate::http::HttpResponse;
    use crate::types::headers;

    #[derive(Clone, Default)]
    struct StubTransport {
        reply: Option<HttpResponse>,
        seen: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl StubTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                reply: Some(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                }),
                seen: Arc::default(),
            }
        }
    }

    impl Transport for StubTransport {
        fn execute(
            &self,
            request: HttpRequest,
        ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send {
            self.seen.lock().unwrap().push(request);
            let reply = self
                .reply
                .clone()
                .ok_or_else(|| ApiError::Transport("connection refused".to_string()));
            async move { reply }
        }
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn client() -> RestClient<StubTransport> {
        RestClient::with_transport(
            ClientConfig::new("http", "api.test.com/", None),
            StubTransport::default(),
        )
    }

    fn client_with(transport: StubTransport) -> RestClient<StubTransport> {
        RestClient::with_transport(ClientConfig::new("http", "localhost", Some(5000)), transport)
    }

    #[test]
    fn url_normalizes_host_and_path_separators() {
        let url = client().build_url("/a/b", &Params::new(), None);
        assert_eq!(url, "http://api.test.com/a/b");
    }

    #[test]
    fn get_sends_data_as_query() {
        let request = CallRequest::get("/api/{frim}/{fram}")
            .path_params(params(json!({"frim": "x y", "fram": 2})))
            .data(params(json!({"tags": ["a", "b"], "page": 1})));
        let http = client().build_request(&request).unwrap();
        assert_eq!(http.method, HttpMethod::Get);
        assert_eq!(
            http.url,
            "http://api.test.com/api/x%20y/2?tags[]=a&tags[]=b&page=1"
        );
        assert!(http.body.is_none());
    }

    #[test]
    fn mutating_methods_send_data_as_body() {
        for request in [
            CallRequest::post("/users/{id}"),
            CallRequest::put("/users/{id}"),
            CallRequest::patch("/users/{id}"),
        ] {
            let request = request
                .path_params(params(json!({"id": 7})))
                .data(params(json!({"name": "Ann"})));
            let http = client().build_request(&request).unwrap();
            assert_eq!(http.url, "http://api.test.com/users/7", "{}", request.method);
            let body: Value = serde_json::from_str(http.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, json!({"name": "Ann"}));
        }
    }

    #[test]
    fn delete_and_head_use_query_string() {
        for request in [CallRequest::delete("/items"), CallRequest::head("/items")] {
            let request = request.data(params(json!({"id": 1})));
            let http = client().build_request(&request).unwrap();
            assert_eq!(http.url, "http://api.test.com/items?id=1");
            assert!(http.body.is_none());
        }
    }

    #[test]
    fn port_is_included_when_configured() {
        let http = client_with(StubTransport::default())
            .build_request(&CallRequest::get("status"))
            .unwrap();
        assert_eq!(http.url, "http://localhost:5000/status");
    }

    #[test]
    fn call_headers_override_client_defaults() {
        let request = CallRequest::get("/a")
            .header("Content-Type", "text/plain")
            .header("X-Trace", "1");
        let http = client().build_request(&request).unwrap();
        assert_eq!(http.header("content-type"), Some("text/plain"));
        assert_eq!(http.header("X-Trace"), Some("1"));
        assert_eq!(http.header("Cache-Control"), Some("no-cache"));
    }

    #[test]
    fn lowercase_call_header_replaces_default_content_type() {
        let request = CallRequest::post("/a").header("content-type", "text/plain");
        let http = client().build_request(&request).unwrap();
        let content_types: Vec<&str> = http
            .headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(content_types, vec!["text/plain"]);
        assert_eq!(http.headers.len(), 2);
    }

    #[test]
    fn default_content_type_is_json() {
        let http = client().build_request(&CallRequest::post("/a")).unwrap();
        assert_eq!(http.header("Content-Type"), Some("application/json"));
        assert_eq!(http.body.as_deref(), Some("{}"));
    }

    #[test]
    fn endpoint_headers_sit_between_defaults_and_call() {
        let client = client();
        let endpoint = client.endpoint(
            HttpMethod::Get,
            "/users/{id}",
            headers([("Accept", "application/json"), ("X-Api", "v1")]),
        );
        let call = endpoint.bind(
            params(json!({"id": 1})),
            Some(Params::new()),
            headers([("X-Api", "v2")]),
        );
        let http = client.build_request(&call).unwrap();
        assert_eq!(http.url, "http://api.test.com/users/1");
        assert_eq!(http.header("X-Api"), Some("v2"));
        assert_eq!(http.header("Accept"), Some("application/json"));
        assert_eq!(http.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn success_runs_success_handler_and_forwards_event() {
        let transport = StubTransport::replying(200, r#"{"x":1}"#);
        let client = client_with(transport.clone());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = Arc::clone(&events);
        let sink: Arc<dyn StateSink> =
            Arc::new(move |event: Event| sink_events.lock().unwrap().push(event));

        let handlers = Handlers::new()
            .sink(sink)
            .on_success(|json, response| {
                assert_eq!(response.status, 200);
                Event::new("FOO", json)
            })
            .on_failure(|_, _| -> Dispatch { panic!("failure handler must not run") });
        client.call(CallRequest::get("/x"), handlers).await;

        assert_eq!(
            *events.lock().unwrap(),
            vec![Event::new("FOO", json!({"x": 1}))]
        );
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn not_found_runs_failure_handler() {
        let client = client_with(StubTransport::replying(404, r#"{"error":"missing"}"#));
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);

        let handlers = Handlers::new()
            .on_success(|_, _| -> Dispatch { panic!("success handler must not run") })
            .on_failure(move |json, response| {
                *slot.lock().unwrap() = Some((json, response.status));
            });
        client.call(CallRequest::get("/missing"), handlers).await;

        assert_eq!(
            *seen.lock().unwrap(),
            Some((json!({"error": "missing"}), 404))
        );
    }

    #[tokio::test]
    async fn transport_failure_runs_error_handler_without_response() {
        let client = client_with(StubTransport::default());
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);

        let handlers = Handlers::new().on_error(move |err, response| {
            *slot.lock().unwrap() = Some((err, response.is_none()));
        });
        client.call(CallRequest::get("/x"), handlers).await;

        assert_eq!(
            *seen.lock().unwrap(),
            Some((ApiError::Transport("connection refused".to_string()), true))
        );
    }

    #[tokio::test]
    async fn bad_json_runs_error_handler_with_response() {
        let client = client_with(StubTransport::replying(200, "<html>"));
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);

        let handlers = Handlers::new().on_error(move |err, response| {
            *slot.lock().unwrap() = Some((
                matches!(err, ApiError::Deserialization(_)),
                response.map(|r| r.status),
            ));
        });
        client.call(CallRequest::get("/x"), handlers).await;

        assert_eq!(*seen.lock().unwrap(), Some((true, Some(200))));
    }

    #[tokio::test]
    async fn call_without_handlers_completes_quietly() {
        let client = client_with(StubTransport::default());
        client.call(CallRequest::delete("/x"), Handlers::new()).await;
    }

    #[tokio::test]
    async fn spawned_call_completes_on_runtime() {
        let transport = StubTransport::replying(201, r#"{"id":3}"#);
        let client = client_with(transport.clone());
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);

        let handle = client.spawn(
            CallRequest::post("/users").data(params(json!({"name": "Ann"}))),
            Handlers::new().on_success(move |json, _| *slot.lock().unwrap() = Some(json)),
        );
        handle.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), Some(json!({"id": 3})));
        let sent = transport.seen.lock().unwrap();
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"name":"Ann"}"#));
    }
}
