//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the single I/O seam of the crate. `UreqTransport` drives a
//! blocking ureq agent on tokio's blocking pool, so it needs a running tokio
//! runtime. Non-2xx statuses come back as data; only failures to obtain a
//! response at all become `ApiError::Transport`. Under
//! `RedirectPolicy::Error` a 3xx answer is such a failure.

use std::fmt;
use std::future::Future;

use crate::config::RedirectPolicy;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// Transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    redirect: RedirectPolicy,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(redirect: RedirectPolicy) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(redirect.max_redirects())
            .build()
            .new_agent();
        Self { agent, redirect }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(RedirectPolicy::default())
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send {
        let agent = self.agent.clone();
        let redirect = self.redirect;
        async move {
            tokio::task::spawn_blocking(move || execute_blocking(&agent, redirect, request))
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?
        }
    }
}

fn execute_blocking(
    agent: &ureq::Agent,
    redirect: RedirectPolicy,
    request: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;
    let body = body.unwrap_or_default();

    let result = match method {
        HttpMethod::Get => with_headers(agent.get(&url), &headers).call(),
        HttpMethod::Head => with_headers(agent.head(&url), &headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&url), &headers).call(),
        HttpMethod::Post => with_headers(agent.post(&url), &headers).send(body.as_bytes()),
        HttpMethod::Put => with_headers(agent.put(&url), &headers).send(body.as_bytes()),
        HttpMethod::Patch => with_headers(agent.patch(&url), &headers).send(body.as_bytes()),
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    // With no redirects followed, ureq hands the 3xx back as data.
    if redirect == RedirectPolicy::Error && response.status().is_redirection() {
        return Err(redirect_rejected(response.status().as_u16()));
    }

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn redirect_rejected(status: u16) -> ApiError {
    ApiError::Transport(format!("redirect ({status}) refused by redirect policy"))
}

fn with_headers<B>(
    builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    headers
        .iter()
        .fold(builder, |builder, (name, value)| {
            builder.header(name.as_str(), value.as_str())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_redirect_is_a_transport_error() {
        assert_eq!(
            redirect_rejected(303),
            ApiError::Transport("redirect (303) refused by redirect policy".to_string())
        );
    }

    #[test]
    fn transport_remembers_its_redirect_policy() {
        assert_eq!(UreqTransport::default().redirect, RedirectPolicy::Follow);
        assert_eq!(
            UreqTransport::new(RedirectPolicy::Error).redirect,
            RedirectPolicy::Error
        );
    }
}
