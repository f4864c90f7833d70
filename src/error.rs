// src/error.rs
//! Error taxonomy shared by the source client, the dispatcher and the monitor.

use std::net::IpAddr;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {code}: {body}")]
    UpstreamStatus { code: u16, body: String },

    /// Upstream body could not be parsed into the expected shape.
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The caller was cancelled while waiting for a rate-limiter token.
    #[error("cancelled while waiting for a rate limit token")]
    RateLimitCancelled,

    #[error("failed to send to all {attempted} destinations, last error: {last_error}")]
    AllDestinationsFailed { attempted: usize, last_error: String },

    #[error("monitor is not running")]
    EngineNotRunning,

    #[error("address {0} is not in the allowlist")]
    Forbidden(IpAddr),

    /// Inbound push payload is not valid JSON or misses required fields.
    #[error("malformed inbound payload: {0}")]
    MalformedPayload(String),

    /// An optional integration was used without credentials.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl Error {
    /// Builds an [`Error::UpstreamStatus`] from a status code and raw body bytes.
    pub(crate) fn upstream(code: reqwest::StatusCode, body: &[u8]) -> Self {
        Self::UpstreamStatus {
            code: code.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}
