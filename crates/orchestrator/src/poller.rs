//! The session poll state machine.
//!
//! The remote API has no completion callback, so a created session is polled
//! until its first output carries a pull request or the attempt budget runs
//! out:
//!
//! ```text
//! CREATED ──begin──▶ POLLING ──pull request──▶ COMPLETED
//!                      │  ▲
//!                      │  └── pending / failed tick (attempts < max), after one interval
//!                      └───── attempts == max ─────▶ TIMED_OUT
//! ```
//!
//! [`PollState::advance`] is the pure transition function; [`SessionPoller`]
//! drives it against a [`SessionApi`] and a [`Sleeper`]. A failed fetch is a
//! tick like any other: it consumes one attempt and never aborts the loop.

use tracing::{debug, info, warn};

use crate::{ApiKey, PollPolicy, PullRequest, SessionApi, SessionId, Sleeper};

/// What one tick observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickObservation {
    /// The first output of the snapshot carries this pull request.
    PullRequest(PullRequest),
    /// The snapshot has no pull request yet.
    Pending,
    /// The fetch failed; the failure has already been logged.
    Failed,
}

/// Position of a session in the poll lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// The session exists; no tick has run yet.
    Created,
    /// `attempts` ticks have run without reaching a terminal state.
    Polling { attempts: u32 },
    /// Terminal: the session produced a pull request.
    Completed {
        pull_request: PullRequest,
        attempts: u32,
    },
    /// Terminal: the attempt budget ran out.
    TimedOut { attempts: u32 },
}

impl PollState {
    /// Enters `POLLING`. Any other state is returned unchanged.
    pub fn begin(self) -> Self {
        match self {
            PollState::Created => PollState::Polling { attempts: 0 },
            other => other,
        }
    }

    /// Applies the observation of the next tick.
    ///
    /// Only `POLLING` reacts; `CREATED` and the terminal states are returned
    /// unchanged, so a terminal state can never be left.
    pub fn advance(self, observation: TickObservation, policy: &PollPolicy) -> Self {
        let PollState::Polling { attempts } = self else {
            return self;
        };
        let attempts = attempts.saturating_add(1);
        match observation {
            TickObservation::PullRequest(pull_request) => PollState::Completed {
                pull_request,
                attempts,
            },
            TickObservation::Pending | TickObservation::Failed
                if attempts >= policy.max_attempts =>
            {
                PollState::TimedOut { attempts }
            }
            TickObservation::Pending | TickObservation::Failed => PollState::Polling { attempts },
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    /// Returns the outcome of a terminal state, `None` otherwise.
    pub fn outcome(&self) -> Option<PollOutcome> {
        match self {
            PollState::Completed {
                pull_request,
                attempts,
            } => Some(PollOutcome::Completed {
                pull_request: pull_request.clone(),
                attempts: *attempts,
            }),
            PollState::TimedOut { attempts } => Some(PollOutcome::TimedOut {
                attempts: *attempts,
            }),
            PollState::Created | PollState::Polling { .. } => None,
        }
    }
}

/// Terminal result of a poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed {
        pull_request: PullRequest,
        attempts: u32,
    },
    TimedOut {
        attempts: u32,
    },
}

impl PollOutcome {
    /// Number of fetches the loop performed.
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Completed { attempts, .. } | PollOutcome::TimedOut { attempts } => {
                *attempts
            }
        }
    }
}

/// Drives [`PollState`] for one session.
///
/// Ticks run strictly one after another; the poller never has two fetches
/// for the same session in flight.
pub struct SessionPoller<'a> {
    api: &'a dyn SessionApi,
    sleeper: &'a dyn Sleeper,
    policy: PollPolicy,
}

impl<'a> SessionPoller<'a> {
    pub fn new(api: &'a dyn SessionApi, sleeper: &'a dyn Sleeper, policy: PollPolicy) -> Self {
        Self {
            api,
            sleeper,
            policy,
        }
    }

    /// Polls `session_id` until a terminal state is reached.
    ///
    /// Waits one interval between ticks, never before the first tick and never
    /// after the last.
    pub async fn run(&self, credential: &ApiKey, session_id: &SessionId) -> PollOutcome {
        let mut state = PollState::Created.begin();
        loop {
            let observation = self.tick(credential, session_id).await;
            state = state.advance(observation, &self.policy);
            if let Some(outcome) = state.outcome() {
                info!(
                    session_id = %session_id,
                    attempts = outcome.attempts(),
                    completed = matches!(outcome, PollOutcome::Completed { .. }),
                    "session poll loop finished"
                );
                return outcome;
            }
            self.sleeper.sleep(self.policy.interval).await;
        }
    }

    async fn tick(&self, credential: &ApiKey, session_id: &SessionId) -> TickObservation {
        match self.api.get_session(credential, session_id).await {
            Ok(session) => match session.first_pull_request() {
                Some(pull_request) => TickObservation::PullRequest(pull_request.clone()),
                None => {
                    debug!(session_id = %session_id, outputs = session.outputs.len(), "session still running");
                    TickObservation::Pending
                }
            },
            Err(error) => {
                warn!(
                    session_id = %session_id,
                    transient = error.is_transient(),
                    error = %error,
                    "polling error"
                );
                TickObservation::Failed
            }
        }
    }
}
