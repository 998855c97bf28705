use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use orchestrator::SessionOrchestrator;

use crate::slack_endpoints::{handle_commands, handle_events, SlackSurface};
use crate::webhook::{handle_repo, handle_token, handle_trigger};
use crate::ListenerError;

pub const HEALTH_PATH: &str = "/healthz";
pub const WEBHOOK_PATH: &str = "/webhook";
pub const WEBHOOK_TOKEN_PATH: &str = "/webhook/token";
pub const WEBHOOK_REPO_PATH: &str = "/webhook/repo";
pub const SLACK_EVENTS_PATH: &str = "/slack/events";
pub const SLACK_COMMANDS_PATH: &str = "/slack/commands";

/// Builds the application router.
///
/// The Slack endpoints are mounted only when a [`SlackSurface`] is given;
/// the webhook and health endpoints are always present. A known path with
/// the wrong method answers `405`.
pub fn build_router(orchestrator: SessionOrchestrator, slack: Option<SlackSurface>) -> Router {
    let webhook = Router::new()
        .route(WEBHOOK_PATH, post(handle_trigger))
        .route(WEBHOOK_TOKEN_PATH, post(handle_token))
        .route(WEBHOOK_REPO_PATH, post(handle_repo))
        .with_state(Arc::new(orchestrator));

    let mut router = Router::new()
        .route(HEALTH_PATH, get(|| async { "ok" }))
        .merge(webhook);

    if let Some(surface) = slack {
        let slack = Router::new()
            .route(SLACK_EVENTS_PATH, post(handle_events))
            .route(SLACK_COMMANDS_PATH, post(handle_commands))
            .with_state(Arc::new(surface));
        router = router.merge(slack);
    }
    router
}

/// Serves `router` on `bind` until `shutdown` resolves.
pub async fn serve(
    bind: SocketAddr,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ListenerError> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|source| ListenerError::Bind { addr: bind, source })?;
    let local_addr = listener.local_addr().unwrap_or(bind);
    info!(addr = %local_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ListenerError::Serve)?;
    info!("server stopped");
    Ok(())
}
