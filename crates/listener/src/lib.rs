//! Jules Relay HTTP surface.
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `POST` | `/slack/events` | Slack Events API (mentions, direct messages) |
//! | `POST` | `/slack/commands` | `/jules-token`, `/jules-repo` |
//! | `POST` | `/webhook` | Start a session for a webhook caller |
//! | `POST` | `/webhook/token` | Register a webhook caller's API key |
//! | `POST` | `/webhook/repo` | Set or clear a webhook caller's repository |
//! | `GET` | `/healthz` | Liveness |
//!
//! Slack requests are signature-checked before their body is decoded. Slow
//! work (polling) always runs on a spawned task so responses go out within
//! Slack's three-second window.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing and HTTP status mapping live here; behaviour
//! lives in the `orchestrator` and `slack` crates.

mod error;
mod server;
mod slack_endpoints;
mod webhook;

pub use error::{ListenerError, WebhookError};
pub use server::{
    build_router, serve, HEALTH_PATH, SLACK_COMMANDS_PATH, SLACK_EVENTS_PATH, WEBHOOK_PATH,
    WEBHOOK_REPO_PATH, WEBHOOK_TOKEN_PATH,
};
pub use slack_endpoints::{SlackSurface, RETRY_NUM_HEADER};
