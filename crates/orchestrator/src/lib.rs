//! Core orchestration domain for Jules Relay.
//!
//! A user asks, from chat or through a webhook, for a remote coding session
//! against one of their GitHub repositories. This crate resolves the
//! repository, creates the session, polls it until it opens a pull request
//! (or the poll budget runs out), and emits exactly one completion notice.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no network or
//! storage dependencies. It defines *what* is needed through the traits in
//! [`ports`]; infrastructure crates (`jules`, `store`, `slack`) define *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`SessionId`, `UserId`, `ApiKey`, ...) |
//! | [`types`] | Remote API types, `PollPolicy`, `CompletionNotice` |
//! | [`errors`] | `OrchestratorError`, `NotifyError` |
//! | [`ports`] | `SessionApi`, `CredentialStore`, `NotificationSink`, `Sleeper` |
//! | [`resolver`] | Preferred-repository source selection |
//! | [`poller`] | The poll state machine and its driver |
//! | [`session`] | `SessionOrchestrator`, the end-to-end algorithm |
//! | [`registration`] | Credential and preferred-repository commands |
//! | [`notify`] | `LogSink`, the passive notification sink |

pub mod errors;
pub mod identifiers;
pub mod notify;
pub mod poller;
pub mod ports;
pub mod registration;
pub mod resolver;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ApiOperation, NotifyError, OrchestratorError};
pub use identifiers::{
    ApiKey, BranchName, ChannelId, EmptyIdentifier, InvocationId, MessageTs, Realm, SessionId,
    SourceId, SourceName, UserId,
};
pub use notify::LogSink;
pub use poller::{PollOutcome, PollState, SessionPoller, TickObservation};
pub use ports::{CredentialStore, NotificationSink, SessionApi, Sleeper, TokioSleeper};
pub use registration::{
    register_credential, set_preferred_repo, CredentialRegistration, RepoPreference,
};
pub use resolver::select_source;
pub use session::{SessionOrchestrator, StartedSession};
pub use types::{
    CompletionNotice, NewSession, PollPolicy, PullRequest, Session, SessionOutput, Source,
    StoreScope,
};
