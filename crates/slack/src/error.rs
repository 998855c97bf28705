//! Errors raised by the Slack adapter.

use thiserror::Error;

/// Failures of a Slack Web API call.
#[derive(Debug, Error)]
pub enum SlackError {
    /// The HTTP client could not be constructed.
    #[error("failed to build slack api client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request could not be sent or its body did not decode.
    #[error("slack {method} request failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Slack answered with a non-success HTTP status.
    #[error("slack {method} failed with status {status}")]
    Status { method: &'static str, status: u16 },

    /// Slack answered `"ok": false`.
    #[error("slack {method} failed: {error}")]
    Api { method: &'static str, error: String },
}

/// Reasons a request fails Slack signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing slack signature headers")]
    MissingHeaders,

    #[error("malformed slack request timestamp")]
    MalformedTimestamp,

    #[error("slack request timestamp is outside the replay window")]
    Stale,

    #[error("malformed slack signature")]
    MalformedSignature,

    #[error("slack signature mismatch")]
    Mismatch,

    #[error("slack signing secret cannot key the verifier")]
    InvalidSecret,
}
