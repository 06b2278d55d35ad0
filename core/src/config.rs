//! Client configuration: target server plus default request options.
//!
//! # Design
//! A `ClientConfig` is fixed when the client is built. Header precedence is
//! call-level over endpoint-level over the defaults held here.

use std::env;

use tracing::{info, warn};

use crate::error::ConfigError;
use crate::types::{headers, merge_headers, Headers};

/// How the request asks intermediaries to treat cached responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Send no cache directive.
    Default,
    /// Ask caches to revalidate with the origin.
    #[default]
    NoCache,
    /// Ask caches not to store the exchange at all.
    NoStore,
}

impl CacheMode {
    fn directive(&self) -> Option<&'static str> {
        match self {
            CacheMode::Default => None,
            CacheMode::NoCache => Some("no-cache"),
            CacheMode::NoStore => Some("no-store"),
        }
    }
}

/// What to do when the server answers with a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Follow up to `MAX_REDIRECTS` hops.
    #[default]
    Follow,
    /// Follow no redirects; a redirect ends in the error branch.
    Error,
}

impl RedirectPolicy {
    pub const MAX_REDIRECTS: u32 = 10;

    pub fn max_redirects(&self) -> u32 {
        match self {
            RedirectPolicy::Follow => Self::MAX_REDIRECTS,
            RedirectPolicy::Error => 0,
        }
    }
}

/// Options applied to every request a client issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub cache: CacheMode,
    pub redirect: RedirectPolicy,
    pub headers: Headers,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache: CacheMode::default(),
            redirect: RedirectPolicy::default(),
            headers: headers([("Content-Type", "application/json")]),
        }
    }
}

impl FetchOptions {
    /// Client-level headers, including the cache directive.
    pub fn default_headers(&self) -> Headers {
        let mut cache = Headers::new();
        if let Some(directive) = self.cache.directive() {
            cache.insert("Cache-Control".to_string(), directive.to_string());
        }
        merge_headers(&cache, &self.headers)
    }
}

/// Target server and defaults for a `RestClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub fetch: FetchOptions,
}

impl ClientConfig {
    pub fn new(scheme: &str, host: &str, port: Option<u16>) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
            fetch: FetchOptions::default(),
        }
    }

    pub fn with_fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    /// Load from `REST_SCHEME`, `REST_HOST` and `REST_PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let scheme = load_or(&lookup, "REST_SCHEME", "http");
        let host = load_or(&lookup, "REST_HOST", "localhost");
        if host.trim().is_empty() {
            warn!("REST_HOST is empty");
            return Err(ConfigError::EmptyHost);
        }
        let port = match lookup("REST_PORT") {
            Some(value) => Some(value.trim().parse::<u16>().map_err(|e| {
                warn!("Invalid REST_PORT value: {e}");
                ConfigError::InvalidPort {
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };
        Ok(Self::new(&scheme, &host, port))
    }
}

fn load_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
