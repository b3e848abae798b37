//! Error types for the bridge client.
//!
//! # Design
//! Errors are grouped by where they are detected: `Configuration` before any
//! network I/O, `Transport` while the request is on the wire, `Decode` once
//! bytes are back, and `Api` when the bridge itself reports a failure inside
//! an otherwise well-formed reply. Nothing is retried or logged here; every
//! variant goes straight back to the caller.

use thiserror::Error;

use crate::envelope::ApiError;
use crate::http::TransportError;

/// Errors returned by the request builder, the clients and discovery.
#[derive(Debug, Error)]
pub enum HueError {
    /// Bad host string or resource addressing, detected before any I/O.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The transport failed to complete the exchange.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body is not JSON, or does not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request payload could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The bridge answered with a non-empty error list.
    #[error("bridge reported an error: {}", first_description(.errors))]
    Api { errors: Vec<ApiError> },

    /// The bridge answered successfully but the addressed resource was absent.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A non-2xx status on an endpoint whose body carries no error envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Discovery completed but returned no bridges.
    #[error("no bridges found")]
    NoBridgesFound,
}

impl HueError {
    /// The bridge-reported errors, if this is an `Api` error.
    pub fn api_errors(&self) -> &[ApiError] {
        match self {
            HueError::Api { errors } => errors,
            _ => &[],
        }
    }
}

fn first_description(errors: &[ApiError]) -> &str {
    errors
        .first()
        .map(|e| e.description.as_str())
        .unwrap_or("unknown error")
}

pub type Result<T> = std::result::Result<T, HueError>;
