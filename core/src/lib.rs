//! Blocking client for the Blesta billing API.
//!
//! # Overview
//! Calls `{base}{model}/{method}.json` endpoints with HTTP Basic or
//! header-based authentication and wraps every answer in a `BlestaResponse`
//! that separates the success payload from the error payload.
//!
//! ```no_run
//! use blesta_core::{BlestaClient, ClientConfig};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), blesta_core::ApiError> {
//! let client = BlestaClient::new(ClientConfig::new("https://billing.example.com/api/", "user", "key"))?;
//! let call = client.get("clients", "get", &json!({"client_id": 1}))?;
//! match call.response.errors() {
//!     Some(errors) => eprintln!("{} failed: {errors}", call.request.url),
//!     None => println!("{:?}", call.response.response()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `BlestaClient` is immutable: the request that was attempted comes back
//!   with each call (`Submission::request`) instead of living on the client.
//! - Requests are built as plain data (`http::HttpRequest`) and executed by a
//!   `Transport`, so URL composition, encoding and auth are testable offline.
//! - A non-200 status is data, not an `Err`. Only bad configuration, bad
//!   arguments and transport failures are errors.
//! - Payloads stay `serde_json::Value`; the crate knows nothing about
//!   clients, invoices or tickets.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod response;
pub mod transport;

pub use client::{BlestaClient, RequestInfo, Submission};
pub use config::{AuthScheme, ClientConfig, Credentials};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::BlestaResponse;
pub use transport::{Transport, UreqTransport};
