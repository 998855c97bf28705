//! In-memory fakes for every port, shared by the crate's unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    ApiKey, ApiOperation, CompletionNotice, CredentialStore, NewSession, NotificationSink,
    NotifyError, OrchestratorError, PullRequest, Realm, Session, SessionApi, SessionId,
    SessionOutput, Sleeper, Source, SourceId, SourceName, StoreScope, UserId,
};

pub(crate) fn source(name: &str, id: &str) -> Source {
    Source {
        name: SourceName::new(name).expect("name"),
        id: SourceId::new(id).expect("id"),
    }
}

pub(crate) fn user(id: &str) -> UserId {
    UserId::new(id).expect("user id")
}

pub(crate) fn session_id(id: &str) -> SessionId {
    SessionId::new(id).expect("session id")
}

pub(crate) fn pending_session(id: &str) -> Session {
    Session {
        id: session_id(id),
        name: format!("sessions/{id}"),
        title: Some("Fix the bug".to_string()),
        outputs: Vec::new(),
    }
}

pub(crate) fn finished_session(id: &str, url: &str) -> Session {
    Session {
        outputs: vec![SessionOutput {
            pull_request: Some(PullRequest {
                url: url.to_string(),
                title: "Fix the bug".to_string(),
            }),
        }],
        ..pending_session(id)
    }
}

pub(crate) fn upstream(operation: ApiOperation, status: u16) -> OrchestratorError {
    OrchestratorError::Upstream {
        operation,
        status,
        body: None,
    }
}

/// Scripted [`SessionApi`].
///
/// `get_session` pops scripted replies in order and answers with a pending
/// snapshot once the script is exhausted.
pub(crate) struct FakeApi {
    pub(crate) sources: Result<Vec<Source>, OrchestratorError>,
    pub(crate) created: Result<Session, OrchestratorError>,
    polls: Mutex<VecDeque<Result<Session, OrchestratorError>>>,
    pub(crate) list_calls: AtomicUsize,
    pub(crate) create_calls: AtomicUsize,
    pub(crate) get_calls: AtomicUsize,
    pub(crate) create_requests: Mutex<Vec<NewSession>>,
}

impl FakeApi {
    pub(crate) fn new(sources: Vec<Source>) -> Self {
        Self {
            sources: Ok(sources),
            created: Ok(pending_session("s-1")),
            polls: Mutex::new(VecDeque::new()),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            create_requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_polls(self, polls: Vec<Result<Session, OrchestratorError>>) -> Self {
        *self.polls.lock().expect("polls lock") = polls.into();
        self
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
            + self.create_calls.load(Ordering::SeqCst)
            + self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionApi for FakeApi {
    async fn list_sources(&self, _credential: &ApiKey) -> Result<Vec<Source>, OrchestratorError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.sources.clone()
    }

    async fn create_session(
        &self,
        _credential: &ApiKey,
        request: &NewSession,
    ) -> Result<Session, OrchestratorError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.created.clone()
    }

    async fn get_session(
        &self,
        _credential: &ApiKey,
        session_id: &SessionId,
    ) -> Result<Session, OrchestratorError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .expect("polls lock")
            .pop_front()
            .unwrap_or_else(|| Ok(pending_session(session_id.as_str())))
    }
}

/// [`Sleeper`] that returns immediately and records each requested pause.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    pub(crate) sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn count(&self) -> usize {
        self.sleeps.lock().expect("sleeps lock").len()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("sleeps lock").push(duration);
    }
}

/// [`NotificationSink`] that records every notice it receives.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) notices: Mutex<Vec<CompletionNotice>>,
    pub(crate) fail: bool,
}

impl RecordingSink {
    pub(crate) fn notices(&self) -> Vec<CompletionNotice> {
        self.notices.lock().expect("notices lock").clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notice: &CompletionNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notices lock")
            .push(notice.clone());
        if self.fail {
            return Err(NotifyError::new("channel_not_found"));
        }
        Ok(())
    }
}

/// Minimal map-backed [`CredentialStore`].
#[derive(Default)]
pub(crate) struct MapStore {
    entries: Mutex<HashMap<(StoreScope, Realm, String), String>>,
}

impl MapStore {
    pub(crate) fn with_credential(self, realm: Realm, user_id: &str, key: &str) -> Self {
        self.entries.lock().expect("store lock").insert(
            (StoreScope::Credential, realm, user_id.to_string()),
            key.to_string(),
        );
        self
    }

    pub(crate) fn with_repo(self, realm: Realm, user_id: &str, repo: &str) -> Self {
        self.entries.lock().expect("store lock").insert(
            (StoreScope::PreferredRepo, realm, user_id.to_string()),
            repo.to_string(),
        );
        self
    }
}

#[async_trait]
impl CredentialStore for MapStore {
    async fn get(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<Option<String>, OrchestratorError> {
        Ok(self
            .entries
            .lock()
            .expect("store lock")
            .get(&(scope, realm, user_id.to_string()))
            .cloned())
    }

    async fn put(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
        value: &str,
    ) -> Result<(), OrchestratorError> {
        self.entries
            .lock()
            .expect("store lock")
            .insert((scope, realm, user_id.to_string()), value.to_string());
        Ok(())
    }

    async fn delete(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<(), OrchestratorError> {
        self.entries
            .lock()
            .expect("store lock")
            .remove(&(scope, realm, user_id.to_string()));
        Ok(())
    }
}
