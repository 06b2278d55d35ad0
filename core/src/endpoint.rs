//! Reusable endpoint descriptors.
//!
//! An `Endpoint` fixes the method, path template and base headers once.
//! `bind` turns it into a `CallRequest` for one set of bindings, and
//! `RestClient::call` runs that request with the caller's handlers.

use crate::client::CallRequest;
use crate::http::HttpMethod;
use crate::types::{merge_headers, Headers, Params};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    method: HttpMethod,
    path_template: String,
    base_headers: Headers,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path_template: impl Into<String>, base_headers: Headers) -> Self {
        Self {
            method,
            path_template: path_template.into(),
            base_headers,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn base_headers(&self) -> &Headers {
        &self.base_headers
    }

    /// Bind path parameters, data and headers for one call.
    ///
    /// With `data: None` the path parameters double as the data; pass
    /// `Some(Params::new())` to send no data. `bind_headers` override the
    /// endpoint's base headers key by key.
    pub fn bind(&self, path_params: Params, data: Option<Params>, bind_headers: Headers) -> CallRequest {
        let data = data.unwrap_or_else(|| path_params.clone());
        CallRequest {
            method: self.method,
            path: self.path_template.clone(),
            path_params,
            data,
            headers: merge_headers(&self.base_headers, &bind_headers),
        }
    }

    /// `bind` with the path parameters doubling as data and no extra headers.
    pub fn with_params(&self, path_params: Params) -> CallRequest {
        self.bind(path_params, None, Headers::new())
    }
}
