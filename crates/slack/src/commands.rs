//! Slash commands: `/jules-token` and `/jules-repo`.

use serde::Serialize;
use tracing::error;

use orchestrator::{
    register_credential, set_preferred_repo, CredentialRegistration, CredentialStore, Realm,
    UserId,
};

use crate::messages;

pub const TOKEN_COMMAND: &str = "/jules-token";
pub const REPO_COMMAND: &str = "/jules-repo";

/// A slash command invocation decoded from its form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashCommand {
    pub command: String,
    pub text: String,
    pub user: UserId,
}

/// Decodes an `application/x-www-form-urlencoded` slash command body.
///
/// Returns `None` when `command` or `user_id` is missing.
pub fn parse_slash_command(body: &[u8]) -> Option<SlashCommand> {
    let mut command = None;
    let mut text = String::new();
    let mut user = None;
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "command" => command = Some(value.trim().to_string()),
            "text" => text = value.into_owned(),
            "user_id" => user = UserId::new(value.trim()),
            _ => {}
        }
    }

    Some(SlashCommand {
        command: command.filter(|c| !c.is_empty())?,
        text,
        user: user?,
    })
}

/// Body of a slash command reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub response_type: &'static str,
    pub text: String,
}

impl CommandResponse {
    /// A reply only the invoking user sees.
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: "ephemeral",
            text: text.into(),
        }
    }
}

/// Runs a slash command against the store. Never fails: storage errors are
/// logged and answered with a generic message.
pub async fn handle_slash_command(
    store: &dyn CredentialStore,
    command: &SlashCommand,
) -> CommandResponse {
    let text = match command.command.as_str() {
        TOKEN_COMMAND => {
            match register_credential(store, Realm::Chat, &command.user, &command.text).await {
                Ok(CredentialRegistration::Status { registered: true }) => {
                    messages::TOKEN_REGISTERED.to_string()
                }
                Ok(CredentialRegistration::Status { registered: false }) => {
                    messages::TOKEN_USAGE.to_string()
                }
                Ok(CredentialRegistration::Saved) => messages::TOKEN_SAVED.to_string(),
                Err(err) => {
                    error!(user_id = %command.user, error = %err, "failed to register token");
                    messages::SETTINGS_FAILED.to_string()
                }
            }
        }
        REPO_COMMAND => {
            match set_preferred_repo(store, Realm::Chat, &command.user, &command.text).await {
                Ok(preference) => messages::repo_preference(&preference),
                Err(err) => {
                    error!(user_id = %command.user, error = %err, "failed to set repository");
                    messages::SETTINGS_FAILED.to_string()
                }
            }
        }
        _ => format!(
            "{} Try `{TOKEN_COMMAND}` or `{REPO_COMMAND}`.",
            messages::UNKNOWN_COMMAND
        ),
    };
    CommandResponse::ephemeral(text)
}
