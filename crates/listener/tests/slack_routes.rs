mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use serde_json::{json, Value};

use common::{build_orchestrator, send, source, user, FakeApi};
use listener::{build_router, SlackSurface, RETRY_NUM_HEADER};
use orchestrator::{CredentialStore, Realm, StoreScope};
use slack::{sign, SlackApiClient, SlackBridge, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use store::MemoryCredentialStore;

const SECRET: &str = "signing-secret";

fn now() -> String {
    chrono::Utc::now().timestamp().to_string()
}

fn signed(path: &str, content_type: &str, body: &str, timestamp: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", content_type)
        .header(TIMESTAMP_HEADER, timestamp)
        .header(
            SIGNATURE_HEADER,
            sign(SECRET, timestamp, body.as_bytes()).expect("sign"),
        )
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn signed_event(body: &Value) -> Request<Body> {
    signed("/slack/events", "application/json", &body.to_string(), &now())
}

async fn router(
    server: &MockServer,
    api: Arc<FakeApi>,
    credentials: &[(Realm, &str, &str)],
) -> (Router, Arc<MemoryCredentialStore>) {
    let (orchestrator, store) = build_orchestrator(api, credentials).await;
    let client = SlackApiClient::new(&server.base_url(), "xoxb-test", Duration::from_secs(5))
        .expect("client");
    let surface = SlackSurface {
        bridge: SlackBridge::new(orchestrator.clone(), client, user("UBOT")),
        signing_secret: SECRET.to_string(),
    };
    (build_router(orchestrator, Some(surface)), store)
}

fn mention(user_id: &str, text: &str) -> Value {
    json!({
        "type": "event_callback",
        "event_id": "Ev1",
        "event": {
            "type": "app_mention",
            "user": user_id,
            "channel": "C1",
            "text": text,
            "ts": "1700.1"
        }
    })
}

#[tokio::test]
async fn url_verification_echoes_challenge() {
    let server = MockServer::start();
    let (router, _) = router(&server, Arc::new(FakeApi::new(Vec::new())), &[]).await;

    let (response, body) = send(
        &router,
        signed_event(&json!({"type": "url_verification", "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body).expect("json");
    assert_eq!(
        body["challenge"],
        "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
    );
}

#[tokio::test]
async fn unsigned_stale_or_forged_requests_are_rejected() {
    let server = MockServer::start();
    let (router, _) = router(&server, Arc::new(FakeApi::new(Vec::new())), &[]).await;
    let body = json!({"type": "url_verification", "challenge": "c"}).to_string();

    let unsigned = Request::builder()
        .method("POST")
        .uri("/slack/events")
        .body(Body::from(body.clone()))
        .expect("request");
    let (response, _) = send(&router, unsigned).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let stale = (chrono::Utc::now().timestamp() - 600).to_string();
    let (response, _) = send(
        &router,
        signed("/slack/events", "application/json", &body, &stale),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let timestamp = now();
    let forged = Request::builder()
        .method("POST")
        .uri("/slack/commands")
        .header(TIMESTAMP_HEADER, &timestamp)
        .header(
            SIGNATURE_HEADER,
            sign("wrong-secret", &timestamp, b"user_id=U1&command=%2Fjules-token&text=k").expect("sign"),
        )
        .body(Body::from("user_id=U1&command=%2Fjules-token&text=k"))
        .expect("request");
    let (response, _) = send(&router, forged).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_command_replies_ephemerally_and_stores_the_key() {
    let server = MockServer::start();
    let (router, store) = router(&server, Arc::new(FakeApi::new(Vec::new())), &[]).await;

    let (response, body) = send(
        &router,
        signed(
            "/slack/commands",
            "application/x-www-form-urlencoded",
            "team_id=T1&user_id=U1&channel_id=C1&command=%2Fjules-token&text=key-123",
            &now(),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body).expect("json");
    assert_eq!(body["response_type"], "ephemeral");
    assert_eq!(
        body["text"],
        "Your Jules API token has been saved securely. You can now @mention me with a task!"
    );
    assert_eq!(
        store
            .get(StoreScope::Credential, Realm::Chat, &user("U1"))
            .await
            .expect("get")
            .as_deref(),
        Some("key-123")
    );
}

#[tokio::test]
async fn redeliveries_and_own_messages_are_acknowledged_and_ignored() {
    let server = MockServer::start();
    let slack_calls = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(json!({"ok": true, "ts": "1700.9"}));
    });
    let api = Arc::new(FakeApi::new(vec![source("acme/api")]));
    let (router, _) = router(&server, api.clone(), &[(Realm::Chat, "U1", "key")]).await;

    let body = mention("U1", "<@UBOT> do it").to_string();
    let mut redelivery = signed("/slack/events", "application/json", &body, &now());
    redelivery
        .headers_mut()
        .insert(RETRY_NUM_HEADER, "1".parse().expect("header"));
    let (response, _) = send(&router, redelivery).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (response, _) = send(&router, signed_event(&mention("UBOT", "<@UBOT> echo"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(slack_calls.calls(), 0);
    assert_eq!(api.created_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mention_is_acknowledged_then_handled_in_background() {
    let server = MockServer::start();
    let ephemeral = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postEphemeral")
            .body_includes("register your Jules API token first");
        then.status(200).json_body(json!({"ok": true}));
    });
    let api = Arc::new(FakeApi::new(vec![source("acme/api")]));
    let (router, _) = router(&server, api.clone(), &[]).await;

    let (response, _) = send(&router, signed_event(&mention("U1", "<@UBOT> do it"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..100 {
        if ephemeral.calls() >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    ephemeral.assert_calls(1);
    assert_eq!(api.created_count(), 0);
}
