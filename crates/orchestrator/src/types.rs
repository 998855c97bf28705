//! Shared value types for the session orchestration domain.
//!
//! The remote task API types ([`Source`], [`Session`], [`SessionOutput`],
//! [`PullRequest`]) mirror the JSON the API returns and are decoded directly
//! by the infrastructure client. The remaining types are produced and consumed
//! inside the orchestrator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{SessionId, SourceId, SourceName};

// ---------------------------------------------------------------------------
// Remote task API
// ---------------------------------------------------------------------------

/// One repository the caller's credential can access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Opaque resource name passed back when creating a session.
    pub name: SourceName,
    /// Short identifier, typically `"github/<owner>/<repo>"`.
    pub id: SourceId,
}

/// A snapshot of one remote task instance.
///
/// Every fetch returns a complete snapshot, never a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Short identifier used in `GET /sessions/{id}`.
    pub id: SessionId,
    /// Full resource name, e.g. `"sessions/123"`.
    pub name: String,
    /// Title the remote service generated for the task, if any.
    #[serde(default)]
    pub title: Option<String>,
    /// Result artefacts accumulated so far, oldest first.
    #[serde(default)]
    pub outputs: Vec<SessionOutput>,
}

impl Session {
    /// Returns the pull request carried by the *first* output, if any.
    ///
    /// Later outputs are ignored: a session produces at most one result.
    pub fn first_pull_request(&self) -> Option<&PullRequest> {
        self.outputs.first().and_then(|o| o.pull_request.as_ref())
    }
}

/// A result artefact attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    /// Pull request opened by the session, when the output is one.
    #[serde(default)]
    pub pull_request: Option<PullRequest>,
}

/// A pull request produced by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// Parameters of a "create session" call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    /// The user's task description. Never empty.
    pub prompt: String,
    /// Source the session works against.
    pub source: SourceName,
}

// ---------------------------------------------------------------------------
// Credential store scopes
// ---------------------------------------------------------------------------

/// Which per-user value a store entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreScope {
    /// The user's API key for the remote task API.
    Credential,
    /// The user's preferred repository hint (free text, e.g. `"org/name"`).
    PreferredRepo,
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// Bounds of the session poll loop.
///
/// The defaults (10 s × 60) cap the total wait at ten minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two consecutive fetches.
    pub interval: Duration,
    /// Maximum number of fetches before giving up. Always at least one.
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

    /// Creates a policy, clamping `max_attempts` to at least one.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_MAX_ATTEMPTS)
    }
}

// ---------------------------------------------------------------------------
// Notification payload
// ---------------------------------------------------------------------------

/// The single terminal payload handed to a notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionNotice {
    pub session_id: SessionId,
    pub pr_url: Option<String>,
    pub pr_title: Option<String>,
    pub timed_out: bool,
}

impl CompletionNotice {
    /// Notice for a session that produced a pull request.
    pub fn completed(session_id: SessionId, pull_request: &PullRequest) -> Self {
        Self {
            session_id,
            pr_url: Some(pull_request.url.clone()),
            pr_title: Some(pull_request.title.clone()),
            timed_out: false,
        }
    }

    /// Notice for a session still running when the poll budget ran out.
    pub fn timed_out(session_id: SessionId) -> Self {
        Self {
            session_id,
            pr_url: None,
            pr_title: None,
            timed_out: true,
        }
    }
}
