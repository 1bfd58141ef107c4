//! Error types for the JSON API client.
//!
//! # Design
//! Each variant wraps the error raised by the layer that failed (URL parser,
//! JSON encoder, transport, JSON decoder) and exposes it as `source()`. The
//! status code of a response is never turned into an error.

use thiserror::Error;

/// Errors returned while building, sending, or parsing a JSON request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The address could not be resolved against the base URL.
    #[error("invalid address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Same-origin mode was requested but the address leaves the base origin.
    #[error("{url} is not same-origin with {origin}")]
    CrossOrigin { url: String, origin: String },

    /// A configured header name or value is not valid HTTP.
    #[error("invalid header: {name:?}")]
    InvalidHeader { name: String },

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The request could not reach, or be answered by, the server.
    #[error("transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body is not valid JSON (or not the expected shape).
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}
