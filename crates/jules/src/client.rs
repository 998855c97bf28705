//! HTTP client for the remote task API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use orchestrator::{
    ApiKey, ApiOperation, BranchName, NewSession, OrchestratorError, Session, SessionApi,
    SessionId, Source,
};

use crate::{JulesConfigError, JulesError};

/// Production endpoint of the remote task API.
pub const DEFAULT_API_BASE: &str = "https://jules.googleapis.com/v1alpha";

/// Header that carries the per-user API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Branch every session starts from.
pub const DEFAULT_STARTING_BRANCH: &str = "main";

/// Automation mode that makes the session open a pull request by itself.
pub const AUTOMATION_MODE_AUTO_CREATE_PR: &str = "AUTO_CREATE_PR";

/// Connection settings for [`JulesClient`].
#[derive(Debug, Clone)]
pub struct JulesClientConfig {
    /// Base URL without a trailing slash, e.g. [`DEFAULT_API_BASE`].
    pub api_base: String,
    /// Upper bound on one request, connect to last body byte.
    pub request_timeout: Duration,
    /// Branch new sessions start from. Must not be empty.
    pub starting_branch: String,
}

impl Default for JulesClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            starting_branch: DEFAULT_STARTING_BRANCH.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListSourcesResponse {
    #[serde(default)]
    sources: Vec<serde_json::Value>,
}

/// Keeps the entries that decode into a [`Source`]. An entry with a blank or
/// missing `name` or `id` is skipped rather than failing the whole listing.
fn usable_sources(entries: Vec<serde_json::Value>) -> Vec<Source> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Source>(entry) {
            Ok(source) => Some(source),
            Err(err) => {
                warn!(index, error = %err, "skipping unusable source entry");
                None
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    prompt: &'a str,
    source_context: SourceContext<'a>,
    automation_mode: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceContext<'a> {
    source: &'a str,
    github_repo_context: GithubRepoContext<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GithubRepoContext<'a> {
    starting_branch: &'a str,
}

/// Stateless client for `GET /sources`, `POST /sessions` and
/// `GET /sessions/{id}`.
///
/// Every call carries the caller's API key. Nothing is retried or cached.
#[derive(Clone)]
pub struct JulesClient {
    http: reqwest::Client,
    api_base: String,
    starting_branch: BranchName,
}

impl JulesClient {
    pub fn new(config: JulesClientConfig) -> Result<Self, JulesConfigError> {
        let starting_branch =
            BranchName::new(config.starting_branch.trim()).ok_or(JulesConfigError::EmptyStartingBranch)?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("jules-relay"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout.max(Duration::from_millis(1)))
            .build()
            .map_err(JulesConfigError::Build)?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            starting_branch,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
        credential: &ApiKey,
    ) -> reqwest::RequestBuilder {
        builder.header(API_KEY_HEADER, credential.expose())
    }

    /// Sends a request and decodes a 2xx JSON body.
    ///
    /// `keep_body` keeps the response text of a failure in the error.
    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: ApiOperation,
        request: reqwest::RequestBuilder,
        keep_body: bool,
    ) -> Result<T, JulesError> {
        let response = request
            .send()
            .await
            .map_err(|source| JulesError::Transport { operation, source })?;

        let status = response.status();
        debug!(operation = %operation, status = status.as_u16(), "remote task api response");
        if !status.is_success() {
            let body = if keep_body {
                Some(response.text().await.unwrap_or_default())
            } else {
                None
            };
            return Err(JulesError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| JulesError::Transport { operation, source })
    }

    pub async fn list_sources(&self, credential: &ApiKey) -> Result<Vec<Source>, JulesError> {
        let request = self.authorized(self.http.get(self.url("sources")), credential);
        let response: ListSourcesResponse = self
            .send_json(ApiOperation::ListSources, request, false)
            .await?;
        Ok(usable_sources(response.sources))
    }

    pub async fn create_session(
        &self,
        credential: &ApiKey,
        new_session: &NewSession,
    ) -> Result<Session, JulesError> {
        let body = CreateSessionRequest {
            prompt: &new_session.prompt,
            source_context: SourceContext {
                source: new_session.source.as_str(),
                github_repo_context: GithubRepoContext {
                    starting_branch: self.starting_branch.as_str(),
                },
            },
            automation_mode: AUTOMATION_MODE_AUTO_CREATE_PR,
        };
        let request = self
            .authorized(self.http.post(self.url("sessions")), credential)
            .json(&body);
        self.send_json(ApiOperation::CreateSession, request, true)
            .await
    }

    pub async fn get_session(
        &self,
        credential: &ApiKey,
        session_id: &SessionId,
    ) -> Result<Session, JulesError> {
        let path = format!("sessions/{}", session_id.as_str());
        let request = self.authorized(self.http.get(self.url(&path)), credential);
        self.send_json(ApiOperation::GetSession, request, false)
            .await
    }
}

#[async_trait]
impl SessionApi for JulesClient {
    async fn list_sources(&self, credential: &ApiKey) -> Result<Vec<Source>, OrchestratorError> {
        Ok(JulesClient::list_sources(self, credential).await?)
    }

    async fn create_session(
        &self,
        credential: &ApiKey,
        request: &NewSession,
    ) -> Result<Session, OrchestratorError> {
        Ok(JulesClient::create_session(self, credential, request).await?)
    }

    async fn get_session(
        &self,
        credential: &ApiKey,
        session_id: &SessionId,
    ) -> Result<Session, OrchestratorError> {
        Ok(JulesClient::get_session(self, credential, session_id).await?)
    }
}
