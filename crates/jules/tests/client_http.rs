use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use jules::{JulesClient, JulesClientConfig, JulesConfigError, JulesError};
use orchestrator::{
    ApiKey, ApiOperation, NewSession, OrchestratorError, SessionApi, SessionId, SourceName,
};

fn client(server: &MockServer) -> JulesClient {
    JulesClient::new(JulesClientConfig {
        api_base: format!("{}/v1alpha/", server.base_url()),
        request_timeout: Duration::from_secs(5),
        ..JulesClientConfig::default()
    })
    .expect("client")
}

fn key() -> ApiKey {
    ApiKey::new("test-jules-key").expect("key")
}

#[tokio::test]
async fn list_sources_sends_api_key_and_keeps_order() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1alpha/sources")
            .header("x-goog-api-key", "test-jules-key");
        then.status(200).json_body(json!({
            "sources": [
                {"name": "sources/github/acme/api", "id": "github/acme/api"},
                {"name": "sources/github/acme/web", "id": "github/acme/web"}
            ]
        }));
    });

    let sources = client(&server)
        .list_sources(&key())
        .await
        .expect("sources");

    mock.assert_calls(1);
    let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["github/acme/api", "github/acme/web"]);
}

#[tokio::test]
async fn list_sources_without_field_is_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1alpha/sources");
        then.status(200).json_body(json!({}));
    });

    let sources = client(&server)
        .list_sources(&key())
        .await
        .expect("sources");
    assert!(sources.is_empty());
}

#[tokio::test]
async fn list_sources_skips_blank_or_incomplete_entries() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1alpha/sources");
        then.status(200).json_body(json!({
            "sources": [
                {"name": "", "id": "github/acme/blank"},
                {"name": "sources/github/acme/no-id"},
                {"name": "sources/github/acme/web", "id": "github/acme/web"}
            ]
        }));
    });

    let sources = client(&server)
        .list_sources(&key())
        .await
        .expect("sources");
    let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["sources/github/acme/web"]);
}

#[tokio::test]
async fn list_sources_failure_maps_to_upstream_without_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1alpha/sources");
        then.status(401).body("bad key");
    });

    let err = SessionApi::list_sources(&client(&server), &key())
        .await
        .expect_err("must fail");
    assert_eq!(
        err,
        OrchestratorError::Upstream {
            operation: ApiOperation::ListSources,
            status: 401,
            body: None,
        }
    );
}

#[tokio::test]
async fn create_session_posts_expected_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1alpha/sessions")
            .header("x-goog-api-key", "test-jules-key")
            .json_body(json!({
                "prompt": "add a README",
                "sourceContext": {
                    "source": "sources/github/acme/api",
                    "githubRepoContext": {"startingBranch": "main"}
                },
                "automationMode": "AUTO_CREATE_PR"
            }));
        then.status(200).json_body(json!({
            "name": "sessions/987",
            "id": "987",
            "title": "Add a README"
        }));
    });

    let session = client(&server)
        .create_session(
            &key(),
            &NewSession {
                prompt: "add a README".to_string(),
                source: SourceName::new("sources/github/acme/api").expect("name"),
            },
        )
        .await
        .expect("session");

    mock.assert_calls(1);
    assert_eq!(session.id.as_str(), "987");
    assert_eq!(session.title.as_deref(), Some("Add a README"));
    assert!(session.outputs.is_empty());
}

#[tokio::test]
async fn create_session_failure_preserves_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1alpha/sessions");
        then.status(500).body("backend exploded");
    });

    let err = SessionApi::create_session(
        &client(&server),
        &key(),
        &NewSession {
            prompt: "x".to_string(),
            source: SourceName::new("sources/github/acme/api").expect("name"),
        },
    )
    .await
    .expect_err("must fail");

    assert_eq!(
        err.to_string(),
        "Failed to create session: 500 - backend exploded"
    );
    assert_eq!(err.upstream_status(), Some(500));
}

#[tokio::test]
async fn get_session_decodes_pull_request_output() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1alpha/sessions/987")
            .header("x-goog-api-key", "test-jules-key");
        then.status(200).json_body(json!({
            "name": "sessions/987",
            "id": "987",
            "outputs": [
                {"pullRequest": {"url": "https://github.com/acme/api/pull/5", "title": "Add README"}}
            ]
        }));
    });

    let session = client(&server)
        .get_session(&key(), &SessionId::new("987").expect("id"))
        .await
        .expect("session");

    mock.assert_calls(1);
    let pr = session.first_pull_request().expect("pull request");
    assert_eq!(pr.url, "https://github.com/acme/api/pull/5");
}

#[tokio::test]
async fn get_session_failure_is_transient_upstream_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1alpha/sessions/987");
        then.status(503);
    });

    let err = SessionApi::get_session(&client(&server), &key(), &SessionId::new("987").expect("id"))
        .await
        .expect_err("must fail");
    assert!(err.is_transient());
    assert_eq!(err.upstream_status(), Some(503));
}

#[tokio::test]
async fn undecodable_body_is_a_transport_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1alpha/sessions/987");
        then.status(200).body("not json");
    });

    let err = client(&server)
        .get_session(&key(), &SessionId::new("987").expect("id"))
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        JulesError::Transport {
            operation: ApiOperation::GetSession,
            ..
        }
    ));
}

#[test]
fn blank_starting_branch_is_rejected() {
    let err = JulesClient::new(JulesClientConfig {
        starting_branch: "  ".to_string(),
        ..JulesClientConfig::default()
    })
    .err()
    .expect("must fail");
    assert!(matches!(err, JulesConfigError::EmptyStartingBranch));
}
