//! Jules Relay credential and preference store adapters.
//!
//! Implements [`orchestrator::CredentialStore`] twice:
//!
//! - [`MemoryCredentialStore`]: a process-local map. Nothing survives a
//!   restart; used for development and tests.
//! - [`FileCredentialStore`]: a JSON document on disk, rewritten atomically
//!   on every change. Durable, no TTL.
//!
//! Both address entries by the same storage key (see [`storage_key`]), so a
//! dump of one can seed the other.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File layout, serialisation and write serialisation
//! live here. The [`orchestrator`] crate sees only
//! [`orchestrator::CredentialStore`].

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::{FileCredentialStore, STORE_SCHEMA_VERSION};
pub use memory::MemoryCredentialStore;

use orchestrator::{Realm, StoreScope, UserId};

/// Returns the key an entry is stored under.
///
/// | Realm | Credential | Preferred repository |
/// |-------|------------|----------------------|
/// | chat | `token:<id>` | `repo:<id>` |
/// | webhook | `webhook_token:<id>` | `webhook_repo:<id>` |
pub fn storage_key(scope: StoreScope, realm: Realm, user_id: &UserId) -> String {
    let prefix = match (realm, scope) {
        (Realm::Chat, StoreScope::Credential) => "token",
        (Realm::Chat, StoreScope::PreferredRepo) => "repo",
        (Realm::Webhook, StoreScope::Credential) => "webhook_token",
        (Realm::Webhook, StoreScope::PreferredRepo) => "webhook_repo",
    };
    format!("{prefix}:{}", user_id.as_str())
}
