//! `/slack/events` and `/slack/commands`.
//!
//! Both endpoints read the raw body so the signature can be checked before
//! anything is decoded.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error, warn, Instrument};

use orchestrator::InvocationId;
use slack::{
    parse_slash_command, verify_signature, EventEnvelope, SlackBridge, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};

/// Header Slack adds when it redelivers an event it thinks was not handled.
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";

/// Everything the Slack endpoints need.
#[derive(Clone)]
pub struct SlackSurface {
    pub bridge: SlackBridge,
    pub signing_secret: String,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn now_unix_secs() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

fn authenticate(surface: &SlackSurface, headers: &HeaderMap, body: &[u8]) -> Result<(), Response> {
    verify_signature(
        &surface.signing_secret,
        header(headers, TIMESTAMP_HEADER),
        header(headers, SIGNATURE_HEADER),
        body,
        now_unix_secs(),
    )
    .map_err(|err| {
        warn!(error = %err, "rejected slack request");
        (StatusCode::UNAUTHORIZED, "invalid signature").into_response()
    })
}

/// Acknowledges an event at once and handles it on a spawned task.
pub(crate) async fn handle_events(
    State(surface): State<Arc<SlackSurface>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = authenticate(&surface, &headers, &body) {
        return rejection;
    }

    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "undecodable slack event payload");
            return (StatusCode::BAD_REQUEST, "Invalid JSON").into_response();
        }
    };

    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventEnvelope::EventCallback { event_id, event } => {
            if let Some(retry) = header(&headers, RETRY_NUM_HEADER) {
                debug!(event_id = event_id.as_deref().unwrap_or_default(), retry, "ignoring slack redelivery");
                return StatusCode::OK.into_response();
            }
            let Some(chat_event) = surface.bridge.accept(&event) else {
                debug!(kind = %event.kind, "ignoring slack event");
                return StatusCode::OK.into_response();
            };

            let invocation_id = InvocationId::new_random();
            let bridge = surface.bridge.clone();
            let event_id = event_id.unwrap_or_default();
            tokio::spawn(
                async move {
                    if let Err(err) = bridge.handle_event(invocation_id, chat_event).await {
                        error!(error = %err, "slack event handling failed");
                    }
                }
                .instrument(tracing::info_span!("slack_event", event_id = %event_id)),
            );
            StatusCode::OK.into_response()
        }
        EventEnvelope::Unsupported => StatusCode::OK.into_response(),
    }
}

pub(crate) async fn handle_commands(
    State(surface): State<Arc<SlackSurface>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = authenticate(&surface, &headers, &body) {
        return rejection;
    }
    let Some(command) = parse_slash_command(&body) else {
        return (StatusCode::BAD_REQUEST, "Missing command or user_id").into_response();
    };
    Json(surface.bridge.handle_command(&command).await).into_response()
}
