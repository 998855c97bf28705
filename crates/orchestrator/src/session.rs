//! The top-level session orchestration algorithm shared by every trigger
//! surface.
//!
//! 1. Look up the user's API key ([`SessionOrchestrator::authenticate`]).
//! 2. List the sources the key can access; none → `NoSourcesAvailable`.
//! 3. Resolve one source using the user's preferred-repository hint.
//! 4. Create the session. Any failure aborts before polling starts.
//! 5. Poll to a terminal state and hand one [`CompletionNotice`] to the sink
//!    ([`SessionOrchestrator::run_to_completion`]).
//!
//! Steps 2–4 are [`SessionOrchestrator::start_with`]. Trigger surfaces call
//! the steps separately so they can reply to the user in between.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::{
    resolver::select_source, ApiKey, CompletionNotice, CredentialStore, NewSession,
    NotificationSink, OrchestratorError, PollOutcome, PollPolicy, Realm, Session, SessionApi,
    SessionPoller, Sleeper, Source, StoreScope, TokioSleeper, UserId,
};

/// A session that has been created and not yet polled.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub credential: ApiKey,
    pub source: Source,
    pub session: Session,
}

/// Drives one invocation from credential lookup to the completion notice.
///
/// Holds no per-invocation state, so one instance is shared by all
/// concurrent invocations.
#[derive(Clone)]
pub struct SessionOrchestrator {
    api: Arc<dyn SessionApi>,
    store: Arc<dyn CredentialStore>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
}

impl SessionOrchestrator {
    /// Creates an orchestrator using the tokio timer and the default
    /// [`PollPolicy`].
    pub fn new(api: Arc<dyn SessionApi>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            store,
            sleeper: Arc::new(TokioSleeper),
            policy: PollPolicy::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The credential store, for registration commands.
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Looks up the user's API key.
    ///
    /// Fails with [`OrchestratorError::Unauthenticated`] when none (or only a
    /// blank value) is stored. Makes no remote call.
    pub async fn authenticate(
        &self,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<ApiKey, OrchestratorError> {
        let stored = self
            .store
            .get(StoreScope::Credential, realm, user_id)
            .await?;
        stored
            .and_then(ApiKey::new)
            .ok_or_else(|| OrchestratorError::Unauthenticated {
                realm,
                user_id: user_id.clone(),
            })
    }

    /// Authenticates the user, then runs [`SessionOrchestrator::start_with`].
    pub async fn start(
        &self,
        realm: Realm,
        user_id: &UserId,
        prompt: &str,
    ) -> Result<StartedSession, OrchestratorError> {
        let credential = self.authenticate(realm, user_id).await?;
        self.start_with(credential, realm, user_id, prompt).await
    }

    /// Resolves a source and creates exactly one session for `prompt`.
    #[instrument(skip_all, fields(realm = %realm, user_id = %user_id))]
    pub async fn start_with(
        &self,
        credential: ApiKey,
        realm: Realm,
        user_id: &UserId,
        prompt: &str,
    ) -> Result<StartedSession, OrchestratorError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(OrchestratorError::EmptyPrompt);
        }

        let sources = self.api.list_sources(&credential).await?;
        let preferred = self
            .store
            .get(StoreScope::PreferredRepo, realm, user_id)
            .await?;
        let source = select_source(&sources, preferred.as_deref())
            .cloned()
            .ok_or(OrchestratorError::NoSourcesAvailable)?;

        let request = NewSession {
            prompt: prompt.to_string(),
            source: source.name.clone(),
        };
        let session = self.api.create_session(&credential, &request).await?;
        info!(
            session_id = %session.id,
            source = %source.name,
            preferred = preferred.as_deref().unwrap_or(""),
            "session created"
        );

        Ok(StartedSession {
            credential,
            source,
            session,
        })
    }

    /// Polls a started session to a terminal state and notifies `sink` once.
    ///
    /// Never fails: fetch errors are absorbed by the poll loop and a sink
    /// failure is logged, not retried.
    #[instrument(skip_all, fields(session_id = %started.session.id))]
    pub async fn run_to_completion(
        &self,
        started: &StartedSession,
        sink: &dyn NotificationSink,
    ) -> PollOutcome {
        let session_id = &started.session.id;
        let outcome = SessionPoller::new(self.api.as_ref(), self.sleeper.as_ref(), self.policy)
            .run(&started.credential, session_id)
            .await;

        let notice = match &outcome {
            PollOutcome::Completed { pull_request, .. } => {
                CompletionNotice::completed(session_id.clone(), pull_request)
            }
            PollOutcome::TimedOut { .. } => CompletionNotice::timed_out(session_id.clone()),
        };
        if let Err(err) = sink.notify(&notice).await {
            error!(session_id = %session_id, error = %err, "failed to deliver completion notice");
        }
        outcome
    }

    /// Runs the whole algorithm: authenticate, start, poll, notify.
    pub async fn run(
        &self,
        realm: Realm,
        user_id: &UserId,
        prompt: &str,
        sink: &dyn NotificationSink,
    ) -> Result<PollOutcome, OrchestratorError> {
        let started = self.start(realm, user_id, prompt).await?;
        Ok(self.run_to_completion(&started, sink).await)
    }
}
