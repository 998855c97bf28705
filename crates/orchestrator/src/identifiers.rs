//! Newtype domain identifiers.
//!
//! Every identity that crosses a port boundary is a distinct newtype wrapping
//! a string. A [`SessionId`] cannot be passed where a [`SourceName`] is
//! expected even though both are text on the wire.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and the
// String conversions serde uses so an empty value never deserializes.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(EmptyIdentifier(stringify!($name)))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

/// Returned when an empty string is decoded into a string identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} must not be empty")]
pub struct EmptyIdentifier(&'static str);

// ---------------------------------------------------------------------------
// Remote task API identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// Short identifier of a remote session (the last segment of its resource name).
    SessionId
}

string_id! {
    /// Opaque resource name of a source, e.g. `"sources/github/acme/widgets"`.
    ///
    /// This is the value passed back to the API when creating a session.
    SourceName
}

string_id! {
    /// Short identifier of a source, e.g. `"github/acme/widgets"`.
    SourceId
}

string_id! {
    /// A Git branch name (e.g. `"main"`).
    BranchName
}

// ---------------------------------------------------------------------------
// Trigger-surface identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies the person who triggered an invocation, within one [`Realm`].
    UserId
}

string_id! {
    /// A chat channel (public channel, private channel, or direct-message channel).
    ChannelId
}

string_id! {
    /// Timestamp identifier of a chat message; doubles as the thread key.
    MessageTs
}

/// Identity namespace that a [`UserId`] belongs to.
///
/// Chat users and webhook callers are authenticated by different systems, so
/// the same raw id in two realms refers to two unrelated people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Realm {
    /// Users identified by the chat platform.
    Chat,
    /// Callers identified by the external system that invokes the webhook.
    Webhook,
}

impl Realm {
    /// Returns the realm name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Realm::Chat => "chat",
            Realm::Webhook => "webhook",
        }
    }
}

impl std::fmt::Display for Realm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// Per-user API key for the remote task API.
///
/// `Debug` and `Display` never print the key; use [`ApiKey::expose`] at the
/// single point where it is written into a request header.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a key from raw text, trimming surrounding whitespace.
    ///
    /// Returns `None` if nothing remains after trimming.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the raw key.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed, generated locally
// ---------------------------------------------------------------------------

/// Identifies one handling of one trigger (chat event, slash command, or
/// webhook call).
///
/// Generated fresh for every invocation and attached to its tracing span so
/// all activity for one request can be correlated, including the detached
/// poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
