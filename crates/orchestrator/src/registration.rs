//! Registration commands shared by the chat slash commands and the webhook
//! registration endpoints.
//!
//! Both surfaces accept free text from the user; blank text is a query for
//! the current state rather than an update.

use tracing::info;

use crate::{CredentialStore, OrchestratorError, Realm, StoreScope, UserId};

/// Keyword that removes a stored preferred repository.
pub const CLEAR_KEYWORD: &str = "clear";

/// Result of [`register_credential`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRegistration {
    /// No key was supplied; reports whether one is already stored.
    Status { registered: bool },
    /// The supplied key was stored.
    Saved,
}

/// Stores the user's API key, or reports whether one exists when `raw` is
/// blank. The key is trimmed and never logged.
pub async fn register_credential(
    store: &dyn CredentialStore,
    realm: Realm,
    user_id: &UserId,
    raw: &str,
) -> Result<CredentialRegistration, OrchestratorError> {
    let token = raw.trim();
    if token.is_empty() {
        let registered = store
            .get(StoreScope::Credential, realm, user_id)
            .await?
            .is_some_and(|v| !v.trim().is_empty());
        return Ok(CredentialRegistration::Status { registered });
    }

    store
        .put(StoreScope::Credential, realm, user_id, token)
        .await?;
    info!(realm = %realm, user_id = %user_id, "token registered");
    Ok(CredentialRegistration::Saved)
}

/// Result of [`set_preferred_repo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoPreference {
    /// No value was supplied; reports the stored preference.
    Current(Option<String>),
    /// The stored preference was removed.
    Cleared,
    /// The supplied value was stored.
    Saved(String),
}

/// Updates, clears, or reports the user's preferred repository.
///
/// `clear` (any case) removes the preference so the first available source is
/// used again.
pub async fn set_preferred_repo(
    store: &dyn CredentialStore,
    realm: Realm,
    user_id: &UserId,
    raw: &str,
) -> Result<RepoPreference, OrchestratorError> {
    let repo = raw.trim();
    if repo.is_empty() {
        let current = store
            .get(StoreScope::PreferredRepo, realm, user_id)
            .await?
            .filter(|v| !v.trim().is_empty());
        return Ok(RepoPreference::Current(current));
    }

    if repo.eq_ignore_ascii_case(CLEAR_KEYWORD) {
        store
            .delete(StoreScope::PreferredRepo, realm, user_id)
            .await?;
        info!(realm = %realm, user_id = %user_id, "preferred repository cleared");
        return Ok(RepoPreference::Cleared);
    }

    store
        .put(StoreScope::PreferredRepo, realm, user_id, repo)
        .await?;
    info!(realm = %realm, user_id = %user_id, repo, "preferred repository set");
    Ok(RepoPreference::Saved(repo.to_string()))
}
