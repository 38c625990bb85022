//! Request submission for the Blesta API.
//!
//! # Design
//! `BlestaClient` holds configuration only and carries no mutable state
//! between calls, so one client can be shared across threads. Each call is
//! split in two: `build_request` composes the URL, encodes the arguments and
//! attaches credentials without any I/O, then the configured `Transport`
//! performs the round-trip. What was attempted is returned with the response
//! as a `RequestInfo` instead of being remembered on the client.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{AuthScheme, ClientConfig, Credentials};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::query;
use crate::response::BlestaResponse;
use crate::transport::{Transport, UreqTransport};

/// Format suffix appended to every endpoint.
pub const RESPONSE_FORMAT: &str = "json";

pub const HEADER_API_USER: &str = "BLESTA-API-USER";
pub const HEADER_API_KEY: &str = "BLESTA-API-KEY";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The endpoint and arguments of one attempted call.
///
/// `url` never includes the query string; `args` are exactly what the caller
/// passed, before encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestInfo {
    pub url: String,
    pub args: Map<String, Value>,
}

/// A completed round-trip: what was sent and what came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub request: RequestInfo,
    pub response: BlestaResponse,
}

impl Submission {
    pub fn into_response(self) -> BlestaResponse {
        self.response
    }
}

/// Blocking client for a single API endpoint and credential pair.
pub struct BlestaClient {
    base_url: String,
    credentials: Credentials,
    auth: AuthScheme,
    debug: bool,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for BlestaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlestaClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("auth", &self.auth)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl BlestaClient {
    /// Validate `config` and build a client using the ureq transport.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = UreqTransport::new(config.ssl_verify, config.timeout());
        Self::with_transport(config, transport)
    }

    /// Validate `config` and build a client that sends through `transport`.
    ///
    /// The url is used as given: calls go to `{url}{model}/{method}.json`,
    /// so it normally ends with `/`.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self, ApiError> {
        config.validate()?;

        Ok(Self {
            base_url: config.url,
            credentials: config.credentials,
            auth: config.auth,
            debug: config.debug,
            transport: Box::new(transport),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        self.auth
    }

    pub fn get<A: Serialize + ?Sized>(&self, model: &str, method: &str, args: &A) -> Result<Submission, ApiError> {
        self.submit(HttpMethod::Get, model, method, args)
    }

    pub fn post<A: Serialize + ?Sized>(&self, model: &str, method: &str, args: &A) -> Result<Submission, ApiError> {
        self.submit(HttpMethod::Post, model, method, args)
    }

    pub fn put<A: Serialize + ?Sized>(&self, model: &str, method: &str, args: &A) -> Result<Submission, ApiError> {
        self.submit(HttpMethod::Put, model, method, args)
    }

    pub fn delete<A: Serialize + ?Sized>(&self, model: &str, method: &str, args: &A) -> Result<Submission, ApiError> {
        self.submit(HttpMethod::Delete, model, method, args)
    }

    /// Send one call and wrap whatever the server answered.
    ///
    /// Non-200 statuses are not errors here; inspect `response.errors()`.
    /// Only local misuse and transport failures return `Err`.
    pub fn submit<A: Serialize + ?Sized>(
        &self,
        verb: HttpMethod,
        model: &str,
        method: &str,
        args: &A,
    ) -> Result<Submission, ApiError> {
        let (request, info) = self.build_request(verb, model, method, args)?;

        let response = match self.transport.execute(&request) {
            Ok(response) => response,
            Err(source) => {
                tracing::debug!(url = %request.url, verb = %verb, error = %source, "blesta transport failure");
                return Err(ApiError::Transport {
                    request: Box::new(info),
                    source,
                });
            }
        };

        tracing::debug!(url = %request.url, verb = %verb, status = response.status, "blesta response");
        if self.debug {
            tracing::info!(
                target: "blesta_core::debug",
                url = %request.url,
                verb = %verb,
                status = response.status,
                body = %response.body,
                "blesta api call"
            );
        }

        Ok(Submission {
            request: info,
            response: BlestaResponse::from(response),
        })
    }

    /// Compose the request for a call without sending it.
    pub fn build_request<A: Serialize + ?Sized>(
        &self,
        verb: HttpMethod,
        model: &str,
        method: &str,
        args: &A,
    ) -> Result<(HttpRequest, RequestInfo), ApiError> {
        if model.is_empty() || method.is_empty() {
            return Err(ApiError::InvalidArguments(
                "model and method must be non-empty".to_string(),
            ));
        }

        let args = to_args(args)?;
        let info = RequestInfo {
            url: format!("{}{model}/{method}.{RESPONSE_FORMAT}", self.base_url),
            args,
        };

        let encoded = query::encode(&info.args);
        let mut headers = self.auth_headers();
        let mut url = info.url.clone();
        let mut body = None;

        if verb.carries_body() {
            if !encoded.is_empty() {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
                body = Some(encoded);
            }
        } else if !encoded.is_empty() {
            url.push('?');
            url.push_str(&encoded);
        }

        let request = HttpRequest {
            method: verb,
            url,
            headers,
            body,
        };
        Ok((request, info))
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        let Credentials { user, key } = &self.credentials;
        match self.auth {
            AuthScheme::Header => vec![
                (HEADER_API_USER.to_string(), user.clone()),
                (HEADER_API_KEY.to_string(), key.clone()),
            ],
            AuthScheme::Basic => {
                let token = STANDARD.encode(format!("{user}:{key}"));
                vec![("Authorization".to_string(), format!("Basic {token}"))]
            }
        }
    }
}

/// Serialize caller arguments into a JSON object. `null` means no arguments.
fn to_args<A: Serialize + ?Sized>(args: &A) -> Result<Map<String, Value>, ApiError> {
    let value = serde_json::to_value(args).map_err(|e| ApiError::InvalidArguments(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ApiError::InvalidArguments(format!(
            "arguments must serialize to an object, got {other}"
        ))),
    }
}
