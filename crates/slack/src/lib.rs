//! Jules Relay chat adapter for Slack.
//!
//! - [`SlackApiClient`]: `chat.postMessage`, `chat.postEphemeral`,
//!   `reactions.add` and `auth.test`, authenticated with the bot token.
//! - [`verify_signature`]: the `v0` request-signing check every inbound
//!   request must pass.
//! - [`events`] and [`commands`]: decoding of Events API payloads and slash
//!   command forms.
//! - [`SlackBridge`]: the mention and direct-message flows on top of
//!   [`orchestrator::SessionOrchestrator`].
//! - [`SlackThreadSink`]: delivers the completion notice into the thread.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP routing lives in the `listener` crate; this
//! crate turns already-received bytes into orchestrator calls and Slack
//! replies.

mod api;
mod bridge;
pub mod commands;
mod error;
pub mod events;
pub mod messages;
mod signature;
mod sink;

pub use api::{SlackApiClient, DEFAULT_SLACK_API_BASE};
pub use bridge::{SlackBridge, ACK_REACTION};
pub use commands::{parse_slash_command, CommandResponse, SlashCommand};
pub use error::{SignatureError, SlackError};
pub use events::{ChatEvent, ChatEventKind, EventEnvelope, SlackEvent};
pub use signature::{
    sign, verify_signature, MAX_TIMESTAMP_SKEW_SECS, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
pub use sink::SlackThreadSink;
