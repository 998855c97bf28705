//! The webhook trigger: `POST /webhook` plus its registration siblings.
//!
//! Callers identify themselves with `triggeredByUserId`, which lives in the
//! webhook realm, separate from chat user ids.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info_span, Instrument};

use orchestrator::{
    register_credential, set_preferred_repo, InvocationId, LogSink, OrchestratorError, Realm,
    RepoPreference, SessionOrchestrator, UserId,
};

use crate::WebhookError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerRequest {
    #[serde(default, alias = "triggeredByNotionUserId")]
    triggered_by_user_id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    #[serde(default, alias = "triggeredByNotionUserId")]
    triggered_by_user_id: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoRequest {
    #[serde(default, alias = "triggeredByNotionUserId")]
    triggered_by_user_id: Option<String>,
    #[serde(default)]
    repo: Option<String>,
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, WebhookError> {
    serde_json::from_slice(body).map_err(|_| WebhookError::BadRequest("Invalid JSON".to_string()))
}

/// Returns the trimmed value, or a `400 Missing <field>` rejection.
fn required(value: Option<String>, field: &str) -> Result<String, WebhookError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WebhookError::missing(field))
}

fn caller(value: Option<String>) -> Result<UserId, WebhookError> {
    required(value, "triggeredByUserId")
        .and_then(|id| UserId::new(id).ok_or_else(|| WebhookError::missing("triggeredByUserId")))
}

fn message(text: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": text }))).into_response()
}

/// Starts a session and answers as soon as it exists. Polling continues on a
/// spawned task and its result is only logged.
pub(crate) async fn handle_trigger(
    State(orchestrator): State<Arc<SessionOrchestrator>>,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let request: TriggerRequest = parse(&body)?;
    let user_id = caller(request.triggered_by_user_id)?;
    let text = required(request.text, "text")?;

    let started = match orchestrator.start(Realm::Webhook, &user_id, &text).await {
        Ok(started) => started,
        Err(OrchestratorError::Unauthenticated { .. }) => return Err(WebhookError::Unauthorized),
        Err(OrchestratorError::NoSourcesAvailable) => return Err(WebhookError::NotFound),
        Err(err) => {
            error!(user_id = %user_id, error = %err, "failed to create webhook jules session");
            return Err(WebhookError::Internal("Failed to start Jules session"));
        }
    };

    let invocation_id = InvocationId::new_random();
    let mut body = json!({
        "message": "Jules session started",
        "sessionId": started.session.id,
    });
    if let Some(title) = &started.session.title {
        body["title"] = json!(title);
    }

    let span = info_span!(
        "webhook_poll",
        invocation_id = %invocation_id,
        realm = %Realm::Webhook,
        user_id = %user_id,
        session_id = %started.session.id,
    );
    let poller = Arc::clone(&orchestrator);
    tokio::spawn(
        async move {
            let sink = LogSink::new(invocation_id);
            poller.run_to_completion(&started, &sink).await;
        }
        .instrument(span),
    );

    Ok((StatusCode::OK, Json(body)).into_response())
}

pub(crate) async fn handle_token(
    State(orchestrator): State<Arc<SessionOrchestrator>>,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let request: TokenRequest = parse(&body)?;
    let user_id = caller(request.triggered_by_user_id)?;
    let token = required(request.token, "token")?;

    register_credential(orchestrator.store(), Realm::Webhook, &user_id, &token)
        .await
        .map_err(|err| {
            error!(user_id = %user_id, error = %err, "failed to register webhook token");
            WebhookError::Internal("Failed to register token")
        })?;
    Ok(message("Webhook token registered"))
}

pub(crate) async fn handle_repo(
    State(orchestrator): State<Arc<SessionOrchestrator>>,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let request: RepoRequest = parse(&body)?;
    let user_id = caller(request.triggered_by_user_id)?;
    let repo = required(request.repo, "repo")?;

    let preference = set_preferred_repo(orchestrator.store(), Realm::Webhook, &user_id, &repo)
        .await
        .map_err(|err| {
            error!(user_id = %user_id, error = %err, "failed to set webhook repository");
            WebhookError::Internal("Failed to register repo")
        })?;
    let text = match preference {
        RepoPreference::Cleared => "Webhook repo cleared",
        _ => "Webhook repo registered",
    };
    Ok(message(text))
}
