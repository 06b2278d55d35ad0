//! Error types for the templated REST client.
//!
//! # Design
//! The client never returns these to the caller of `call`. An `ApiError` is
//! the payload handed to the error handler: either the round-trip itself
//! failed, or a response arrived whose body was not JSON. Application-level
//! rejections (non-2xx statuses with a JSON body) are not errors at all and
//! go to the failure handler instead.

use thiserror::Error;

/// Errors delivered to the `on_error` handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response: connection refused, DNS,
    /// redirect policy violation and the like.
    #[error("transport failed: {0}")]
    Transport(String),

    /// A response arrived but its body is not valid JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request data could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Errors raised while loading a `ClientConfig` from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid port {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },

    #[error("host must not be empty")]
    EmptyHost,
}
