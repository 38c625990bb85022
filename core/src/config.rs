//! Client configuration.
//!
//! A `ClientConfig` can be written literally, deserialized with serde, or
//! read from `BLESTA_*` environment variables. Validation (non-empty url,
//! user and key) happens in `BlestaClient::new`, so every source goes through
//! the same check.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const ENV_URL: &str = "BLESTA_API_URL";
pub const ENV_USER: &str = "BLESTA_API_USER";
pub const ENV_KEY: &str = "BLESTA_API_KEY";
pub const ENV_AUTH: &str = "BLESTA_AUTH";
pub const ENV_SSL_VERIFY: &str = "BLESTA_SSL_VERIFY";
pub const ENV_DEBUG: &str = "BLESTA_DEBUG";
pub const ENV_TIMEOUT_SECS: &str = "BLESTA_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// How credentials are attached to each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Basic base64(user:key)`.
    #[default]
    Basic,
    /// `BLESTA-API-USER` and `BLESTA-API-KEY` headers.
    Header,
}

impl FromStr for AuthScheme {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthScheme::Basic),
            "header" | "headers" => Ok(AuthScheme::Header),
            other => Err(ApiError::Config(format!(
                "unknown auth scheme {other:?} (expected \"basic\" or \"header\")"
            ))),
        }
    }
}

/// API user and key. `Debug` output masks the key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("key", &"*".repeat(self.key.len().min(10)))
            .finish()
    }
}

/// Everything needed to construct a `BlestaClient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://billing.example.com/api/`.
    pub url: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub auth: AuthScheme,
    /// Verify TLS certificates and hostnames.
    #[serde(default = "default_true")]
    pub ssl_verify: bool,
    /// Log url, verb, status and body of every call on the `blesta_core::debug` target.
    #[serde(default)]
    pub debug: bool,
    /// Global per-call timeout in milliseconds. Must be non-zero.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: Credentials {
                user: user.into(),
                key: key.into(),
            },
            auth: AuthScheme::default(),
            ssl_verify: true,
            debug: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_auth(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_ssl_verify(mut self, ssl_verify: bool) -> Self {
        self.ssl_verify = ssl_verify;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sub-millisecond remainders round up, so only `Duration::ZERO` maps to
    /// zero (which `validate` then rejects).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.timeout_ms = if ms == 0 && !timeout.is_zero() { 1 } else { ms };
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Read the configuration from `BLESTA_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| ApiError::Config(format!("{name} is not set")))
        };

        let mut config = Self::new(required(ENV_URL)?, required(ENV_USER)?, required(ENV_KEY)?);
        if let Some(auth) = lookup(ENV_AUTH) {
            config.auth = auth.parse()?;
        }
        if let Some(value) = lookup(ENV_SSL_VERIFY) {
            config.ssl_verify = parse_bool(ENV_SSL_VERIFY, &value)?;
        }
        if let Some(value) = lookup(ENV_DEBUG) {
            config.debug = parse_bool(ENV_DEBUG, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = value.trim().parse().map_err(|_| {
                ApiError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {value:?}"))
            })?;
            config.timeout_ms = secs.saturating_mul(1000);
        }
        Ok(config)
    }

    /// Reject empty url, user or key, and a zero timeout.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.url.trim().is_empty() {
            return Err(ApiError::Config("API URL is required".to_string()));
        }
        if self.credentials.user.trim().is_empty() {
            return Err(ApiError::Config("API user is required".to_string()));
        }
        if self.credentials.key.trim().is_empty() {
            return Err(ApiError::Config("API key is required".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ApiError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ApiError::Config(format!("{name} must be a boolean, got {value:?}"))),
    }
}
