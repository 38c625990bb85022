//! Error types for the Blesta API client.
//!
//! # Design
//! Only local misuse and transport failures are errors. A remote failure
//! (any non-200 status) is a normal `BlestaResponse` whose `errors()` view
//! carries the details, so there is no `HttpError` variant here. A body that
//! is not JSON is likewise folded into the envelope rather than raised.

use thiserror::Error;

use crate::client::RequestInfo;

/// Errors returned by `BlestaClient` and the opt-in typed response view.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed client configuration. Raised before any I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// Request arguments did not serialize to a JSON object.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// No HTTP response was obtained (DNS, connect, TLS or read failure).
    ///
    /// Carries the attempted request so callers can still inspect it.
    #[error("transport error for {}: {source}", .request.url)]
    Transport {
        request: Box<RequestInfo>,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The `response` field could not be deserialized into the requested type.
    #[error("deserialization failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// The request that was being attempted, if this is a transport failure.
    pub fn request(&self) -> Option<&RequestInfo> {
        match self {
            ApiError::Transport { request, .. } => Some(request.as_ref()),
            _ => None,
        }
    }
}
