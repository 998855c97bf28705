//! Conversational flows: a mention in a channel and a direct message.
//!
//! Both flows authenticate, start one session and poll it to completion on
//! the calling task. They differ in where replies go:
//!
//! | | Mention | Direct message |
//! |---|---|---|
//! | Missing key | ephemeral hint | channel message |
//! | Empty prompt | thread reply | ignored |
//! | Acknowledgement | `rocket` reaction | none |
//! | Start / failure | thread reply | channel message |
//! | Completion | thread reply | thread reply |

use tracing::{error, info, instrument, warn};

use orchestrator::{
    InvocationId, MessageTs, OrchestratorError, PollOutcome, Realm, SessionOrchestrator, UserId,
};

use crate::commands::{handle_slash_command, CommandResponse, SlashCommand};
use crate::events::{normalize_event, strip_bot_mention, ChatEvent, ChatEventKind, SlackEvent};
use crate::{messages, SlackApiClient, SlackError, SlackThreadSink};

/// Reaction added to a mention once a session is about to start.
pub const ACK_REACTION: &str = "rocket";

/// Connects Slack to the session orchestrator.
#[derive(Clone)]
pub struct SlackBridge {
    orchestrator: SessionOrchestrator,
    client: SlackApiClient,
    bot_user_id: UserId,
}

impl SlackBridge {
    pub fn new(orchestrator: SessionOrchestrator, client: SlackApiClient, bot_user_id: UserId) -> Self {
        Self {
            orchestrator,
            client,
            bot_user_id,
        }
    }

    pub fn bot_user_id(&self) -> &UserId {
        &self.bot_user_id
    }

    /// See [`normalize_event`].
    pub fn accept(&self, event: &SlackEvent) -> Option<ChatEvent> {
        normalize_event(event, &self.bot_user_id)
    }

    pub async fn handle_command(&self, command: &SlashCommand) -> CommandResponse {
        handle_slash_command(self.orchestrator.store(), command).await
    }

    /// Runs one chat event to its end, including the poll loop.
    ///
    /// Returns the poll outcome when a session was started. Orchestration
    /// failures are reported to the user; only Slack API failures are
    /// returned as errors.
    #[instrument(
        skip_all,
        fields(invocation_id = %invocation_id, kind = ?event.kind, user_id = %event.user)
    )]
    pub async fn handle_event(
        &self,
        invocation_id: InvocationId,
        event: ChatEvent,
    ) -> Result<Option<PollOutcome>, SlackError> {
        let is_mention = event.kind == ChatEventKind::Mention;
        // Mentions reply in a thread under the triggering message.
        let reply_ts = is_mention.then_some(&event.ts);

        let credential = match self.orchestrator.authenticate(Realm::Chat, &event.user).await {
            Ok(credential) => credential,
            Err(OrchestratorError::Unauthenticated { .. }) => {
                info!("no token registered");
                if is_mention {
                    self.client
                        .post_ephemeral(&event.channel, &event.user, messages::NEED_TOKEN)
                        .await?;
                } else {
                    self.client
                        .post_message(&event.channel, messages::NEED_TOKEN, None)
                        .await?;
                }
                return Ok(None);
            }
            Err(err) => return self.report_failure(&event, reply_ts, &err).await,
        };

        let prompt = match event.kind {
            ChatEventKind::Mention => strip_bot_mention(&event.text, &self.bot_user_id),
            ChatEventKind::DirectMessage => event.text.trim().to_string(),
        };
        if prompt.is_empty() {
            if is_mention {
                self.client
                    .post_message(&event.channel, messages::EMPTY_PROMPT, Some(&event.ts))
                    .await?;
            }
            return Ok(None);
        }

        if is_mention {
            if let Err(err) = self
                .client
                .add_reaction(&event.channel, &event.ts, ACK_REACTION)
                .await
            {
                warn!(error = %err, "failed to add reaction");
            }
        }

        let started = match self
            .orchestrator
            .start_with(credential, Realm::Chat, &event.user, &prompt)
            .await
        {
            Ok(started) => started,
            Err(err) => return self.report_failure(&event, reply_ts, &err).await,
        };

        let announcement = if is_mention {
            messages::mention_started(&started.session, &prompt)
        } else {
            messages::direct_started(&started.session, &prompt)
        };
        // The session exists either way; keep polling so the result still
        // reaches the thread.
        if let Err(err) = self
            .client
            .post_message(&event.channel, &announcement, reply_ts)
            .await
        {
            warn!(session_id = %started.session.id, error = %err, "failed to announce session");
        }

        let sink = SlackThreadSink::new(self.client.clone(), event.channel.clone(), event.ts.clone());
        Ok(Some(self.orchestrator.run_to_completion(&started, &sink).await))
    }

    async fn report_failure(
        &self,
        event: &ChatEvent,
        reply_ts: Option<&MessageTs>,
        err: &OrchestratorError,
    ) -> Result<Option<PollOutcome>, SlackError> {
        let text = match err {
            OrchestratorError::NoSourcesAvailable => messages::NO_REPOSITORIES.to_string(),
            other => {
                error!(error = %other, "failed to create jules session");
                match event.kind {
                    ChatEventKind::Mention => messages::mention_failed(other),
                    ChatEventKind::DirectMessage => messages::direct_failed(other),
                }
            }
        };
        self.client
            .post_message(&event.channel, &text, reply_ts)
            .await?;
        Ok(None)
    }
}
