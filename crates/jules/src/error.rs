//! Errors raised by [`crate::JulesClient`]: construction and calls are kept
//! apart so only call failures map onto [`OrchestratorError`].

use thiserror::Error;

use orchestrator::{ApiOperation, OrchestratorError};

/// Raised by [`crate::JulesClient::new`] before any request is made.
#[derive(Debug, Error)]
pub enum JulesConfigError {
    /// The HTTP client could not be constructed.
    #[error("failed to build remote task api client: {0}")]
    Build(#[source] reqwest::Error),

    /// The configured starting branch is blank.
    #[error("starting branch must not be empty")]
    EmptyStartingBranch,
}

/// Raised by a call to the remote task API.
#[derive(Debug, Error)]
pub enum JulesError {
    /// The API answered with a non-success status.
    #[error("remote task api {operation} failed with status {status}")]
    Status {
        operation: ApiOperation,
        status: u16,
        body: Option<String>,
    },

    /// The request could not be sent, timed out, or its body did not decode.
    #[error("remote task api {operation} request failed: {source}")]
    Transport {
        operation: ApiOperation,
        #[source]
        source: reqwest::Error,
    },
}

impl From<JulesError> for OrchestratorError {
    fn from(err: JulesError) -> Self {
        match err {
            JulesError::Status {
                operation,
                status,
                body,
            } => OrchestratorError::Upstream {
                operation,
                status,
                body,
            },
            JulesError::Transport { operation, source } => OrchestratorError::Transport {
                operation,
                message: source.without_url().to_string(),
            },
        }
    }
}
