//! Jules Relay remote task API adapter.
//!
//! Implements the [`orchestrator::SessionApi`] trait over the remote task
//! API's HTTP/JSON interface: `GET /sources`, `POST /sessions` and
//! `GET /sessions/{id}`, authenticated with the caller's API key in the
//! `x-goog-api-key` header.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request formatting, response decoding and status
//! mapping live here. The [`orchestrator`] crate sees only
//! [`orchestrator::SessionApi`] and [`orchestrator::OrchestratorError`].
//!
//! This adapter never retries: a failed "get session" is one failed poll
//! tick, and the poll loop decides what happens next.

pub mod client;
pub mod error;

pub use client::{
    JulesClient, JulesClientConfig, API_KEY_HEADER, AUTOMATION_MODE_AUTO_CREATE_PR,
    DEFAULT_API_BASE, DEFAULT_STARTING_BRANCH,
};
pub use error::{JulesConfigError, JulesError};
