//! Jules Relay entry point.
//!
//! This binary is the composition root. It:
//!
//! 1. Loads and validates configuration ([`config`]).
//! 2. Installs `tracing-subscriber` with a JSON (or pretty) formatter and an
//!    optional OpenTelemetry OTLP exporter ([`telemetry`]).
//! 3. Builds the infrastructure: `JulesClient`, the credential store (file or
//!    memory) and, when Slack secrets are present, the Slack bridge.
//! 4. Serves the HTTP surface until Ctrl-C, then flushes traces.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use jules::JulesClient;
use listener::{build_router, serve, SlackSurface};
use orchestrator::{CredentialStore, SessionOrchestrator};
use slack::{SlackApiClient, SlackBridge};
use store::{FileCredentialStore, MemoryCredentialStore};

use crate::config::{load_settings, Args, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;
    let telemetry = telemetry::init(&settings.telemetry)?;

    let result = run(settings).await;
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "jules relay stopped with an error");
    }
    telemetry.shutdown();
    result
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let api = Arc::new(
        JulesClient::new(settings.jules.clone()).context("failed to build jules client")?,
    );

    let store: Arc<dyn CredentialStore> = match &settings.store_path {
        Some(path) => Arc::new(
            FileCredentialStore::open(path)
                .await
                .context("failed to open credential store")?,
        ),
        None => {
            warn!("no store path configured; credentials are kept in memory only");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let orchestrator = SessionOrchestrator::new(api, store).with_policy(settings.poll_policy);
    let slack = slack_surface(&settings, orchestrator.clone()).await?;
    info!(
        bind = %settings.bind,
        slack_enabled = slack.is_some(),
        poll_interval_secs = settings.poll_policy.interval.as_secs(),
        poll_max_attempts = settings.poll_policy.max_attempts,
        "starting jules relay"
    );

    let router = build_router(orchestrator, slack);
    serve(settings.bind, router, shutdown_signal()).await?;
    Ok(())
}

async fn slack_surface(
    settings: &Settings,
    orchestrator: SessionOrchestrator,
) -> anyhow::Result<Option<SlackSurface>> {
    let Some(secrets) = &settings.slack_secrets else {
        info!("slack secrets not set; slack endpoints disabled");
        return Ok(None);
    };

    let client = SlackApiClient::new(
        &settings.slack_api_base,
        &secrets.bot_token,
        settings.slack_request_timeout,
    )
    .context("failed to build slack client")?;
    let bot_user_id = match &settings.slack_bot_user_id {
        Some(id) => id.clone(),
        None => client
            .resolve_bot_user_id()
            .await
            .context("failed to resolve slack bot user id")?,
    };
    info!(bot_user_id = %bot_user_id, "slack endpoints enabled");

    Ok(Some(SlackSurface {
        bridge: SlackBridge::new(orchestrator, client, bot_user_id),
        signing_secret: secrets.signing_secret.clone(),
    }))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
