//! Error types for the PokeCollect API client.
//!
//! # Design
//! `ApiError` is produced only by `ApiClient`, from either a transport
//! outcome or an HTTP status. 401/403/404 get dedicated variants because the
//! session layer reacts to them; every other 4xx/5xx lands in `ServerError`
//! with the message recovered from the server's error envelope.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Errors returned by `ApiClient` requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The base URL joined with the endpoint path is not a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A 2xx response arrived with an empty body where a value was expected.
    #[error("no data received from server")]
    NoData,

    /// The response body could not be deserialized into the expected type.
    #[error("failed to decode response: {0}")]
    DecodingError(String),

    /// The request payload could not be serialized to JSON.
    #[error("failed to encode request: {0}")]
    SerializationError(String),

    /// Any 4xx/5xx other than 401, 403 and 404.
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("unknown error"))]
    ServerError { status: u16, message: Option<String> },

    /// Connection refused, reset, DNS failure and similar.
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("access forbidden")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    /// A status outside every classified range (1xx, 3xx, ...).
    #[error("unexpected HTTP status {0}")]
    Unknown(u16),
}

/// The JSON body the server attaches to non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    pub timestamp: i64,
}
