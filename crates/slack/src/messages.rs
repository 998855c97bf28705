//! User-facing message texts.

use orchestrator::{CompletionNotice, RepoPreference, Session};

/// Where users manage their key, repositories and sessions.
pub const JULES_WEB_URL: &str = "https://jules.google.com";

pub const TOKEN_USAGE: &str = "Usage: `/jules-token <your-jules-api-key>`\nGet your API key from https://jules.google.com/settings";
pub const TOKEN_REGISTERED: &str =
    "You have a Jules API token registered. Use `/jules-token <new-token>` to update it.";
pub const TOKEN_SAVED: &str =
    "Your Jules API token has been saved securely. You can now @mention me with a task!";
pub const REPO_USAGE: &str =
    "Usage: `/jules-repo <org/repo-name>`\nExample: `/jules-repo google/jules`";
pub const REPO_CLEARED: &str =
    "Your Jules repository setting has been cleared. I will now use the first available repository.";
pub const NEED_TOKEN: &str = "You need to register your Jules API token first. Use `/jules-token <your-api-key>` to get started.";
pub const EMPTY_PROMPT: &str = "What would you like me to help you with? Please include a task description after mentioning me.";
pub const NO_REPOSITORIES: &str =
    "No GitHub repositories found. Please connect a repository in Jules first: https://jules.google.com";
pub const SETTINGS_FAILED: &str = "Something went wrong saving your settings. Please try again.";
pub const UNKNOWN_COMMAND: &str = "Unknown command.";

/// Title shown when a session starts: the remote title, else the first 50
/// characters of the prompt.
pub fn session_label(session: &Session, prompt: &str) -> String {
    match session.title.as_deref().filter(|title| !title.is_empty()) {
        Some(title) => title.to_string(),
        None => prompt.chars().take(50).collect(),
    }
}

pub fn mention_started(session: &Session, prompt: &str) -> String {
    format!(
        "Starting Jules session: {}\nSession ID: {}\n\nI'll update you when the task completes!",
        session_label(session, prompt),
        session.id
    )
}

pub fn direct_started(session: &Session, prompt: &str) -> String {
    format!(
        "Starting Jules session: {}\nSession ID: {}",
        session_label(session, prompt),
        session.id
    )
}

pub fn mention_failed(error: &impl std::fmt::Display) -> String {
    format!("Failed to start Jules session: {error}")
}

pub fn direct_failed(error: &impl std::fmt::Display) -> String {
    format!("Error: {error}")
}

pub fn completion(notice: &CompletionNotice) -> String {
    match (&notice.pr_url, notice.timed_out) {
        (Some(url), false) => format!("Task completed! Pull request created: {url}"),
        _ => format!(
            "Session {} is still in progress. Check status at {JULES_WEB_URL}",
            notice.session_id
        ),
    }
}

pub fn repo_preference(preference: &RepoPreference) -> String {
    match preference {
        RepoPreference::Current(Some(repo)) => format!(
            "Your Jules repository is set to `{repo}`. Use `/jules-repo <org/repo-name>` to update it or `/jules-repo clear` to reset."
        ),
        RepoPreference::Current(None) => REPO_USAGE.to_string(),
        RepoPreference::Cleared => REPO_CLEARED.to_string(),
        RepoPreference::Saved(repo) => format!("Your Jules repository has been set to `{repo}`."),
    }
}
