//! Error types for the serviceability client.
//!
//! # Design
//! Errors are split by *when* they surface. `ConfigError` and
//! `ValidationError` are returned synchronously, before any I/O, from
//! construction and from `check`/`select`. `CallError` is only ever handed
//! to a response callback, once a request has actually been attempted.
//! Keeping them as separate types means a caller cannot confuse "my input
//! was rejected" with "the service said no".

use thiserror::Error;

/// Configuration rejected while constructing a client.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration object at all (JSON `null`).
    #[error("null or undefined configuration data")]
    Missing,

    /// The configuration text was not valid JSON.
    #[error("configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required key is absent or null.
    #[error("'{key}' is required in the configuration")]
    Required { key: &'static str },

    /// A key is present with the wrong JSON type.
    #[error("{key} should be a(n) {expected}")]
    TypeMismatch {
        key: &'static str,
        expected: &'static str,
    },

    /// A string key is present but empty after trimming.
    #[error("'{key}' must be a non-empty string")]
    Empty { key: &'static str },

    /// The HTTP transport refused the configured proxy.
    #[error("invalid proxy '{proxy}': {reason}")]
    InvalidProxy { proxy: String, reason: String },
}

/// Input rejected at call time, before any request is sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The address was JSON `null`.
    #[error("null or undefined address")]
    AddressMissing,

    /// The address was some JSON value other than an object.
    #[error("address must be an object")]
    AddressNotObject,

    /// A field was absent, null, the wrong type, or blank.
    #[error("parameter '{field}' must be a non-empty string")]
    InvalidField { field: &'static str },

    /// A saved state string was empty or whitespace.
    #[error("state must be a non-empty string")]
    InvalidState,

    /// A `;`-separated state segment is not a `name=value` pair.
    #[error("malformed state segment '{0}'")]
    MalformedStateSegment(String),

    /// The validated address could not be encoded as JSON.
    #[error("address could not be serialized: {0}")]
    Unserializable(String),
}

/// Failure of the HTTP round-trip itself: no response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] ureq::Error),

    #[error("{0}")]
    Other(String),
}

/// Outcome delivered to a response callback when a call does not succeed.
#[derive(Debug, Error)]
pub enum CallError {
    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with something other than 200.
    #[error("Protocol error: HTTP {status}")]
    Protocol { status: u16, body: String },
}

/// Errors that abort client construction.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("saved state rejected: {0}")]
    State(#[from] ValidationError),
}
