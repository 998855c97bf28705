#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;

use orchestrator::{
    ApiKey, CredentialStore, NewSession, OrchestratorError, PollPolicy, PullRequest, Realm,
    Session, SessionApi, SessionId, SessionOrchestrator, SessionOutput, Sleeper, Source,
    SourceId, SourceName, StoreScope, UserId,
};
use store::MemoryCredentialStore;

pub struct FakeApi {
    pub sources: Vec<Source>,
    pub create_error: Option<OrchestratorError>,
    pub title: Option<String>,
    /// Poll number (1-based) from which the session carries a pull request.
    pub pr_from_poll: Option<usize>,
    pub created: Mutex<Vec<NewSession>>,
    pub polls: AtomicUsize,
}

impl FakeApi {
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            sources,
            create_error: None,
            title: Some("Update the changelog".to_string()),
            pr_from_poll: None,
            created: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().expect("lock").len()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionApi for FakeApi {
    async fn list_sources(&self, _credential: &ApiKey) -> Result<Vec<Source>, OrchestratorError> {
        Ok(self.sources.clone())
    }

    async fn create_session(
        &self,
        _credential: &ApiKey,
        request: &NewSession,
    ) -> Result<Session, OrchestratorError> {
        self.created.lock().expect("lock").push(request.clone());
        if let Some(err) = &self.create_error {
            return Err(err.clone());
        }
        Ok(Session {
            id: SessionId::new("s-42").expect("id"),
            name: "sessions/s-42".to_string(),
            title: self.title.clone(),
            outputs: Vec::new(),
        })
    }

    async fn get_session(
        &self,
        _credential: &ApiKey,
        session_id: &SessionId,
    ) -> Result<Session, OrchestratorError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let outputs = match self.pr_from_poll {
            Some(first) if poll >= first => vec![SessionOutput {
                pull_request: Some(PullRequest {
                    url: "https://github.com/acme/api/pull/7".to_string(),
                    title: "Update the changelog".to_string(),
                }),
            }],
            _ => Vec::new(),
        };
        Ok(Session {
            id: session_id.clone(),
            name: format!("sessions/{session_id}"),
            title: None,
            outputs,
        })
    }
}

pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

pub fn source(path: &str) -> Source {
    Source {
        name: SourceName::new(format!("sources/github/{path}")).expect("name"),
        id: SourceId::new(format!("github/{path}")).expect("id"),
    }
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("id")
}

pub async fn build_orchestrator(
    api: Arc<FakeApi>,
    credentials: &[(Realm, &str, &str)],
) -> (SessionOrchestrator, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    for (realm, id, token) in credentials {
        store
            .put(StoreScope::Credential, *realm, &user(id), token)
            .await
            .expect("put");
    }
    let orchestrator = SessionOrchestrator::new(api, store.clone())
        .with_sleeper(Arc::new(NoSleep))
        .with_policy(PollPolicy::new(Duration::from_secs(10), 2));
    (orchestrator, store)
}

/// Waits for background work to reach `expected` polls, then gives it a
/// moment to overrun so an extra poll would be seen.
pub async fn settle_polls(api: &FakeApi, expected: usize) -> usize {
    for _ in 0..100 {
        if api.poll_count() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    api.poll_count()
}

pub async fn send(router: &Router, request: Request<Body>) -> (Response<Body>, String) {
    let response = router.clone().oneshot(request).await.expect("response");
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.expect("read body");
    (
        Response::from_parts(parts, Body::empty()),
        String::from_utf8(bytes.to_vec()).expect("utf8"),
    )
}

pub fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}
