//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! The client builds requests as plain data and hands them to a `Transport`.
//! `UreqTransport` is the default, blocking implementation. Any HTTP status,
//! 4xx and 5xx included, comes back as an `HttpResponse`; only a failure to
//! obtain a response at all is an error.

use std::time::Duration;

use ureq::tls::TlsConfig;
use ureq::Agent;

use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub type TransportResult = Result<HttpResponse, Box<dyn std::error::Error + Send + Sync>>;

/// Performs one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> TransportResult;
}

/// Blocking transport backed by a single `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Build an agent that returns error statuses as data, verifies TLS
    /// unless told otherwise, and gives up after `timeout`.
    pub fn new(ssl_verify: bool, timeout: Duration) -> Self {
        if !ssl_verify {
            tracing::warn!("TLS certificate verification is disabled");
        }
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .tls_config(TlsConfig::builder().disable_verification(!ssl_verify).build())
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> TransportResult {
        let url = request.url.as_str();
        let content_type = request.header("content-type").unwrap_or("application/x-www-form-urlencoded");

        let mut response = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), request).call(),
            (HttpMethod::Delete, None) => with_headers(self.agent.delete(url), request).call(),
            (HttpMethod::Delete, Some(body)) => with_headers(self.agent.delete(url), request)
                .force_send_body()
                .content_type(content_type)
                .send(body.as_bytes()),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(url), request)
                .content_type(content_type)
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(url), request)
                .content_type(content_type)
                .send(body.as_bytes()),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), request).send_empty(),
        }?;

        // Any body is data once a status arrived: no size cap, lossy UTF-8.
        let status = response.status().as_u16();
        let bytes = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        Ok(HttpResponse { status, body })
    }
}

/// Copy every header except content type, which ureq sets from the body.
fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        if name.eq_ignore_ascii_case("content-type") {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
