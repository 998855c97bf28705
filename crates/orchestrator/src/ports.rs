//! Port traits implemented by infrastructure crates.
//!
//! The orchestrator only ever talks to the outside world through these
//! traits. Each is object-safe (via `async_trait`) so the composition root can
//! hold them as `Arc<dyn ...>` and tests can substitute in-memory fakes.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    ApiKey, CompletionNotice, NewSession, NotifyError, OrchestratorError, Realm, Session,
    SessionId, Source, StoreScope, UserId,
};

/// Stateless request/response access to the remote task API.
///
/// Implementations must not retry, back off, or cache: the poll loop owns the
/// retry policy.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Lists the sources the credential can access, in the API's order.
    async fn list_sources(&self, credential: &ApiKey) -> Result<Vec<Source>, OrchestratorError>;

    /// Creates a session that opens a pull request automatically.
    async fn create_session(
        &self,
        credential: &ApiKey,
        request: &NewSession,
    ) -> Result<Session, OrchestratorError>;

    /// Fetches the latest snapshot of a session.
    async fn get_session(
        &self,
        credential: &ApiKey,
        session_id: &SessionId,
    ) -> Result<Session, OrchestratorError>;
}

/// Durable per-user key/value storage for credentials and preferences.
///
/// Entries have no TTL. Concurrency control, if any, is the store's own
/// business.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<Option<String>, OrchestratorError>;

    async fn put(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
        value: &str,
    ) -> Result<(), OrchestratorError>;

    async fn delete(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<(), OrchestratorError>;
}

/// Destination of the single completion notice of a poll loop.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notice: &CompletionNotice) -> Result<(), NotifyError>;
}

/// Suspends the poll loop between ticks.
///
/// Injected so tests can run the full state machine without real time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
