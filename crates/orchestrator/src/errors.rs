//! Error types for the session orchestration domain.
//!
//! [`OrchestratorError`] is what every port returns and what trigger surfaces
//! turn into a user-facing reply. Infrastructure crates keep their own error
//! types and convert at the port boundary.
//!
//! A poll-budget timeout is deliberately *not* an error: it is the
//! [`crate::PollOutcome::TimedOut`] terminal state and produces a normal
//! notification.

use thiserror::Error;

use crate::{Realm, UserId};

/// The remote task API call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    ListSources,
    CreateSession,
    GetSession,
}

impl ApiOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiOperation::ListSources => "list sources",
            ApiOperation::CreateSession => "create session",
            ApiOperation::GetSession => "get session",
        }
    }
}

impl std::fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the orchestrator and its ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// No API key is registered for the user. Not retried; the user is told
    /// how to register one.
    #[error("no API key registered for {realm} user {user_id}")]
    Unauthenticated { realm: Realm, user_id: UserId },

    /// The task description is empty after trimming.
    #[error("task description is empty")]
    EmptyPrompt,

    /// The API key is valid but grants access to zero repositories.
    #[error("no GitHub repositories are connected to this API key")]
    NoSourcesAvailable,

    /// The remote task API answered with a non-success status.
    ///
    /// `body` is kept for "create session" failures so the cause can be
    /// diagnosed; the other operations discard it.
    #[error("Failed to {operation}: {status}{}", body_suffix(.body))]
    Upstream {
        operation: ApiOperation,
        status: u16,
        body: Option<String>,
    },

    /// The remote task API could not be reached or its response could not be
    /// decoded.
    #[error("Failed to {operation}: {message}")]
    Transport {
        operation: ApiOperation,
        message: String,
    },

    /// The credential store failed.
    #[error("credential store error: {message}")]
    Store { message: String },
}

impl OrchestratorError {
    /// Returns `true` for failures a poll tick records and moves past.
    ///
    /// Only remote API failures qualify; authentication and store failures
    /// never occur inside the poll loop.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Upstream { .. } | OrchestratorError::Transport { .. }
        )
    }

    /// HTTP status of an upstream failure, if this is one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            OrchestratorError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|b| format!(" - {b}"))
        .unwrap_or_default()
}

/// Failure delivering a completion notice.
///
/// Logged by the orchestrator; never triggers a second delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification delivery failed: {message}")]
pub struct NotifyError {
    pub message: String,
}

impl NotifyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
