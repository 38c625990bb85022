//! Normalized view over a raw Blesta API response.
//!
//! # Design
//! `BlestaResponse` stores exactly what the server sent (body text and status
//! code) and derives everything else from it. The body is decoded as JSON on
//! first use and cached, so `response()` and `errors()` agree with each other
//! and never re-parse. Success is decided by the status code alone; the body
//! shape only decides *what* the error or success payload looks like.

use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Status code the API uses for a successful call.
pub const STATUS_OK: u16 = 200;

/// Immutable envelope around one API response.
#[derive(Debug, Clone)]
pub struct BlestaResponse {
    raw: String,
    status: u16,
    decoded: OnceLock<Option<Value>>,
}

impl BlestaResponse {
    pub fn new(raw: impl Into<String>, status: u16) -> Self {
        Self {
            raw: raw.into(),
            status,
            decoded: OnceLock::new(),
        }
    }

    /// The `response` field of the decoded body.
    ///
    /// `None` when the body is empty, is not JSON, is not an object, or has
    /// no non-null `response` field.
    pub fn response(&self) -> Option<&Value> {
        self.field("response")
    }

    /// Errors reported by the API, or `None` when the status is 200.
    ///
    /// For any other status this is always `Some`: the body's `errors` field
    /// when present, otherwise `{"error": <decoded body or null>}`.
    pub fn errors(&self) -> Option<Value> {
        if self.is_success() {
            return None;
        }
        if let Some(errors) = self.field("errors") {
            return Some(errors.clone());
        }
        let decoded = self.decoded().cloned().unwrap_or(Value::Null);
        Some(json!({ "error": decoded }))
    }

    pub fn response_code(&self) -> u16 {
        self.status
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// The whole body decoded as JSON, or `None` if it does not parse.
    pub fn decoded(&self) -> Option<&Value> {
        self.decoded
            .get_or_init(|| serde_json::from_str(&self.raw).ok())
            .as_ref()
    }

    /// Deserialize the `response` field into `T`.
    ///
    /// Returns `Ok(None)` when there is no `response` field, and
    /// `ApiError::Decode` when the field does not match `T`.
    pub fn deserialize_response<T: DeserializeOwned>(&self) -> Result<Option<T>, ApiError> {
        match self.response() {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.decoded()
            .and_then(|body| body.get(name))
            .filter(|value| !value.is_null())
    }
}

impl From<HttpResponse> for BlestaResponse {
    fn from(response: HttpResponse) -> Self {
        Self::new(response.body, response.status)
    }
}

impl PartialEq for BlestaResponse {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.raw == other.raw
    }
}

impl Eq for BlestaResponse {}
