//! Slack Web API client: the few methods the bridge needs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use orchestrator::{ChannelId, MessageTs, UserId};

use crate::SlackError;

/// Production Slack Web API base URL.
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Deserialize)]
struct SlackOkResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackAuthTestResponse {
    ok: bool,
    user_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
}

/// Authenticated Slack Web API client using the bot token.
#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl std::fmt::Debug for SlackApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackApiClient")
            .field("api_base", &self.api_base)
            .field("bot_token", &"[redacted]")
            .finish()
    }
}

impl SlackApiClient {
    pub fn new(
        api_base: &str,
        bot_token: &str,
        request_timeout: Duration,
    ) -> Result<Self, SlackError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("jules-relay"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout.max(Duration::from_millis(1)))
            .build()
            .map_err(SlackError::Build)?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.trim().to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        payload: Option<&Value>,
    ) -> Result<T, SlackError> {
        let mut request = self
            .http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(&self.bot_token);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|source| SlackError::Transport { method, source })?;
        let status = response.status();
        debug!(method, status = status.as_u16(), "slack api response");
        if !status.is_success() {
            return Err(SlackError::Status {
                method,
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| SlackError::Transport { method, source })
    }

    fn check(method: &'static str, ok: bool, error: Option<String>) -> Result<(), SlackError> {
        if ok {
            return Ok(());
        }
        Err(SlackError::Api {
            method,
            error: error.unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    /// Resolves the bot's own user id via `auth.test`.
    pub async fn resolve_bot_user_id(&self) -> Result<UserId, SlackError> {
        const METHOD: &str = "auth.test";
        let response: SlackAuthTestResponse = self.call(METHOD, None).await?;
        Self::check(METHOD, response.ok, response.error)?;
        response
            .user_id
            .and_then(UserId::new)
            .ok_or_else(|| SlackError::Api {
                method: METHOD,
                error: "response missing user_id".to_string(),
            })
    }

    /// Posts `text` to a channel, threaded under `thread_ts` when given.
    ///
    /// Returns the timestamp of the new message.
    pub async fn post_message(
        &self,
        channel: &ChannelId,
        text: &str,
        thread_ts: Option<&MessageTs>,
    ) -> Result<Option<MessageTs>, SlackError> {
        const METHOD: &str = "chat.postMessage";
        let mut payload = json!({
            "channel": channel.as_str(),
            "text": text,
        });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.as_str().to_string());
        }

        let response: SlackChatMessageResponse = self.call(METHOD, Some(&payload)).await?;
        Self::check(METHOD, response.ok, response.error)?;
        Ok(response.ts.and_then(MessageTs::new))
    }

    /// Posts a message only `user` can see.
    pub async fn post_ephemeral(
        &self,
        channel: &ChannelId,
        user: &UserId,
        text: &str,
    ) -> Result<(), SlackError> {
        const METHOD: &str = "chat.postEphemeral";
        let payload = json!({
            "channel": channel.as_str(),
            "user": user.as_str(),
            "text": text,
        });
        let response: SlackOkResponse = self.call(METHOD, Some(&payload)).await?;
        Self::check(METHOD, response.ok, response.error)
    }

    /// Adds an emoji reaction (`name` without colons) to a message.
    pub async fn add_reaction(
        &self,
        channel: &ChannelId,
        timestamp: &MessageTs,
        name: &str,
    ) -> Result<(), SlackError> {
        const METHOD: &str = "reactions.add";
        let payload = json!({
            "channel": channel.as_str(),
            "timestamp": timestamp.as_str(),
            "name": name,
        });
        let response: SlackOkResponse = self.call(METHOD, Some(&payload)).await?;
        Self::check(METHOD, response.ok, response.error)
    }
}
